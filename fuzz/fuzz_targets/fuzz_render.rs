#![no_main]

use libfuzzer_sys::fuzz_target;
use provenance_errors::{ErrorContext, render};

// Input layout: template, then `key=value` lines after the first NUL byte.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (template, pairs) = text.split_once('\0').unwrap_or((text, ""));

    let mut context = ErrorContext::new();
    for line in pairs.lines() {
        if let Some((key, value)) = line.split_once('=') {
            context.insert(key, value);
        }
    }

    let rendered = render(template, &context);
    if context.is_empty() {
        assert_eq!(rendered, template);
    }
});
