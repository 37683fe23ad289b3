mod build;
mod curve;
mod info;
mod plot;
