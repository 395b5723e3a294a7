use lasercam_core::data::materials::{compare_versions, init_standard_catalog};
use lasercam_core::{LayerRole, LayerSettings, MaterialProfile, ProfileCatalog, ProfileError};
use std::cmp::Ordering;

fn catalog() -> ProfileCatalog {
    let json = r#"{
        "name": "lab",
        "minimum_version": "0.1",
        "work_area": { "max_x": 800.0, "max_y": 500.0 },
        "startup": "G90",
        "shutdown": "M30",
        "materials": [
            {
                "name": "Acrylic 3mm",
                "heat_sensitive": true,
                "precision": 2,
                "cut": { "feed_rate": 8.0, "power": 90, "pulse": 5000 },
                "engrave": { "feed_rate": 100.0, "power": 20, "pulse": 5000 }
            },
            {
                "name": "MDF",
                "slew_speed": 60.0,
                "header": "G90\nM08",
                "cut": { "feed_rate": 10.0, "power": 100, "pulse": 1000 },
                "engrave": { "feed_rate": 120.0, "power": 30, "pulse": 1000 }
            }
        ]
    }"#;
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_catalog_defaults() {
    let catalog = catalog();
    assert!(!catalog.offline);
    assert_eq!(catalog.work_area.max_x, 800.0);

    let acrylic = catalog.material("acrylic 3MM ").unwrap();
    assert!(acrylic.heat_sensitive);
    assert_eq!(acrylic.precision, 2);
    assert_eq!(acrylic.slew_speed, 45.0);
    assert_eq!(acrylic.header, "G90");
    assert_eq!(acrylic.footer, "M30");
    assert_eq!(acrylic.layer(LayerRole::Cut).power, 90);
}

#[test]
fn test_material_keeps_own_header() {
    let mdf = catalog().material("MDF").unwrap();
    assert_eq!(mdf.header, "G90\nM08");
    assert_eq!(mdf.footer, "M30");
    assert_eq!(mdf.precision, 3);
}

#[test]
fn test_unknown_material() {
    assert_eq!(
        catalog().material("Glass").unwrap_err(),
        ProfileError::UnknownMaterial {
            name: "Glass".to_string()
        }
    );
}

#[test]
fn test_offline_catalog() {
    let mut catalog = catalog();
    catalog.offline = true;
    catalog.offline_message = "Maintenance until monday".to_string();
    assert_eq!(
        catalog.check_available("0.1.0"),
        Err(ProfileError::Offline {
            message: "Maintenance until monday".to_string()
        })
    );
}

#[test]
fn test_outdated_client() {
    let mut catalog = catalog();
    assert!(catalog.check_available("0.1.0").is_ok());
    catalog.minimum_version = Some("2.0".to_string());
    assert!(matches!(
        catalog.check_available("0.1.0"),
        Err(ProfileError::Outdated { .. })
    ));
    assert_eq!(compare_versions("2.0", "0.1.0"), Ordering::Greater);
}

#[test]
fn test_profile_validation() {
    let mut profile = MaterialProfile::new(
        "Test",
        LayerSettings::new(10.0, 50, 1000),
        LayerSettings::new(0.0, 50, 1000),
    );
    assert!(matches!(
        profile.validate(),
        Err(ProfileError::Invalid { .. })
    ));
    profile.engrave.feed_rate = 100.0;
    assert!(profile.validate().is_ok());
    profile.precision = 9;
    assert!(profile.validate().is_err());
}

#[test]
fn test_standard_catalog() {
    let catalog = init_standard_catalog();
    assert!(catalog.material_names().len() >= 3);
    assert!(catalog
        .materials
        .iter()
        .any(|m| m.heat_sensitive));
}
