use super::*;
use crate::fixtures;

#[test]
fn layers_map_onto_shared_modules() {
    let hw = fixtures::dpu();

    assert_eq!(hw.layers(), vec![0, 1, 2]);
    assert_eq!(hw.module(0), hw.module(1));
    assert!(hw.module(3).is_none());

    assert!(hw.has_sub_module(1, "tm_x"));
    assert!(!hw.has_sub_module(2, "tm_x"));
    assert_eq!(hw.sub_module_nodes(0, "gm_coef"), Some(9));

    assert!(hw.module(2).is_some_and(|m| m.supports_bpc(Bpc::Bpc8)));
    assert!(hw.module(2).is_some_and(|m| !m.supports_bpc(Bpc::Bpc10)));
}

#[test]
fn pack_resolves_the_layer_module() {
    let hw = fixtures::dpu();

    let blob = hw.pack(0, "gm_coef", &[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
    assert_eq!(blob.header.byte_offset, 0x20);
    assert_eq!(blob.words, vec![0x0002_0001, 0x0004_0003, 0x0006_0005, 0x0008_0007, 9]);

    assert!(matches!(
        hw.pack(4, "gm_coef", &[0; 9]),
        Err(HdrCoefError::UnknownLayer(4))
    ));
    assert!(matches!(
        hw.pack(2, "gm_coef", &[0; 9]),
        Err(HdrCoefError::InvalidGeometry { .. })
    ));
}

#[test]
fn buffer_size_is_twice_the_largest_module() {
    let hw = fixtures::dpu();
    let full = hw.module(0).unwrap();

    // 16 header bytes, then 12 + 4 * (nodes / per_reg + 1) per sub-module
    let expected: usize = 16
        + full
            .sub_modules
            .values()
            .map(|s| 12 + 4 * (s.num_nodes / s.nodes_per_reg + 1))
            .sum::<usize>();

    assert_eq!(full.max_coefficient_size(), expected);
    assert_eq!(hw.coefficient_buffer_size(), expected * 2);
    assert_eq!(DpuHw::default().coefficient_buffer_size(), 0);
}

#[test]
fn unusable_specifiers_are_dropped() {
    let hw = fixtures::dpu();
    let mut specifiers = fixtures::specifiers();

    specifiers.retain_usable(&hw);

    let full = specifiers.get(0).unwrap();
    assert!(full.tone_map.is_some() && full.pq.is_some() && full.eotf.is_some());

    let wcg_only = specifiers.get(2).unwrap();
    assert_eq!(wcg_only, &ModuleSpecifier::default());
}

#[test]
fn pq_gain_uses_the_largest_fitting_shift() {
    // 10000 / 1000 = 10, 10 << 13 no longer fits 16 bits
    assert_eq!(PqSpecifier::gain(1000, 0xffff, 0x1f), (40960, 12));

    // 10000 / 4000 = 2.5
    assert_eq!(PqSpecifier::gain(4000, 0xffff, 0x1f), (40960, 14));

    // Without shift room the gain is only rounded
    assert_eq!(PqSpecifier::gain(4000, 0xffff, 0), (3, 0));
    assert_eq!(PqSpecifier::gain(10, 0xff, 0x3), (255, 0));
}

#[test]
fn hw_ids_resolve_by_name() {
    assert_eq!(HwId::from_name("DPU"), Some(HwId::Dpu));
    assert_eq!(HwId::from_name("GPU"), None);
    assert_eq!(HwId::Dpu.create().id(), HwId::Dpu);
}
