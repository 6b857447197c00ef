use super::*;

// -------------------- Defaults --------------------

#[test]
fn default_geometry_is_valid() {
    let cfg = StoreConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.nhash, 137);
    assert_eq!(cfg.ptr_width, 7);
    assert_eq!(cfg.len_width, 4);
}

#[test]
fn default_header_layout() {
    let cfg = StoreConfig::default();
    assert_eq!(cfg.free_list_off(), 0);
    assert_eq!(cfg.hash_table_off(), 7);
    assert_eq!(cfg.chain_slot_off(0), 7);
    assert_eq!(cfg.chain_slot_off(136), 7 + 136 * 7);
    // 138 pointer fields plus the terminating newline
    assert_eq!(cfg.header_len(), 138 * 7 + 1);
    assert_eq!(cfg.first_record_off(), cfg.header_len());
    assert_eq!(cfg.append_lock_off(), cfg.header_len());
}

#[test]
fn default_pointer_cap() {
    assert_eq!(StoreConfig::default().max_ptr(), 9_999_999);
}

// -------------------- Validation --------------------

#[test]
fn rejects_zero_slots() {
    let cfg = StoreConfig {
        nhash: 0,
        ..StoreConfig::default()
    };
    assert_eq!(cfg.validate().unwrap_err(), ConfigError::NoSlots);
}

#[test]
fn rejects_bad_widths() {
    let cfg = StoreConfig {
        ptr_width: 0,
        ..StoreConfig::default()
    };
    assert_eq!(cfg.validate().unwrap_err(), ConfigError::PtrWidth(0));

    let cfg = StoreConfig {
        len_width: 20,
        ..StoreConfig::default()
    };
    assert_eq!(cfg.validate().unwrap_err(), ConfigError::LenWidth(20));
}

#[test]
fn rejects_inverted_bounds() {
    let cfg = StoreConfig {
        idx_min: 2048,
        ..StoreConfig::default()
    };
    assert_eq!(
        cfg.validate().unwrap_err(),
        ConfigError::IdxBounds {
            min: 2048,
            max: 1024
        }
    );

    let cfg = StoreConfig {
        dat_min: 0,
        ..StoreConfig::default()
    };
    assert_eq!(
        cfg.validate().unwrap_err(),
        ConfigError::DatBounds { min: 0, max: 1024 }
    );
}

#[test]
fn rejects_length_field_too_narrow() {
    let cfg = StoreConfig {
        len_width: 2,
        ..StoreConfig::default()
    };
    assert_eq!(
        cfg.validate().unwrap_err(),
        ConfigError::LenFieldTooNarrow {
            max: 1024,
            width: 2
        }
    );
}
