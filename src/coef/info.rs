use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use hdr_coef::buffer::ParsedCoefBuffer;
use hdr_coef::xml::ConfigDir;
use hdr_coef::ConfigSource;

use super::input_from_either;
use crate::commands::InfoArgs;

pub struct CoefInfo;

impl CoefInfo {
    pub fn info(args: InfoArgs) -> Result<()> {
        let InfoArgs {
            input,
            input_pos,
            config,
        } = args;

        if let Some(config) = config {
            return Self::capabilities_info(&config);
        }

        let input = input_from_either("info", input, input_pos)?;
        let data = fs::read(&input).with_context(|| format!("Failed reading {}", input.display()))?;

        let buffer = ParsedCoefBuffer::parse(&data)?;
        println!("{}", serde_json::to_string_pretty(&buffer)?);

        Ok(())
    }

    fn capabilities_info(dir: &Path) -> Result<()> {
        let capabilities = ConfigDir::new(dir).capabilities()?;
        let hw = capabilities.hw.as_ref();

        let summary = json!({
            "hw": hw.id().name(),
            "layers": hw.layers(),
            "coefficient_buffer_size": hw.coefficient_buffer_size(),
            "modules": hw.modules(),
            "specifiers": capabilities.specifiers.as_ref(),
        });

        println!("{}", serde_json::to_string_pretty(&summary)?);

        Ok(())
    }
}
