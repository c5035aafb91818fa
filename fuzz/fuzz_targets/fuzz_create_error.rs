#![no_main]

use libfuzzer_sys::fuzz_target;
use provenance_errors::{CreateOptions, ErrorContext, ErrorFactory, FactoryConfig, check_chain};
use serde_json::Value;

// First byte selects strictness; the rest is `definition JSON \0 context JSON`.
fuzz_target!(|data: &[u8]| {
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let (definition, context) = text.split_once('\0').unwrap_or((text, "{}"));
    let Ok(definition) = serde_json::from_str::<Value>(definition) else {
        return;
    };
    let context = serde_json::from_str::<Value>(context)
        .ok()
        .and_then(ErrorContext::from_value)
        .unwrap_or_default();

    let factory = ErrorFactory::new(FactoryConfig::new(mode & 1 == 1).with_capture_stack(false));
    let err = factory.create_error_from_value(&definition, context, None, CreateOptions::default());

    assert!(err.to_json().is_object());
    let _ = err.format();
    let _ = check_chain(&err, &[]);
});
