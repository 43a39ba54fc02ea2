use grain_map::algs::weights::{Kernel, Neighborhood, WeightMapOptions};

#[test]
fn options_deserialize_from_json() {
    let options: WeightMapOptions = serde_json::from_str(
        r#"{ "neighborhood": { "radius": 2.5 }, "kernel": { "gaussian": { "sigma": 0.8 } } }"#,
    )
    .unwrap();
    assert_eq!(options.neighborhood, Neighborhood::Radius(2.5));
    assert_eq!(options.kernel, Kernel::Gaussian { sigma: 0.8 });
    options.validate().unwrap();
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let options: WeightMapOptions = serde_json::from_str(r#"{ "kernel": "uniform" }"#).unwrap();
    assert_eq!(options, WeightMapOptions::default());
    let options: WeightMapOptions =
        serde_json::from_str(r#"{ "neighborhood": "containing_cell" }"#).unwrap();
    assert_eq!(options.kernel, Kernel::Uniform);
}

#[test]
fn invalid_values_fail_validation() {
    let options: WeightMapOptions =
        serde_json::from_str(r#"{ "neighborhood": { "radius": -1.0 } }"#).unwrap();
    assert!(options.validate().is_err());
}
