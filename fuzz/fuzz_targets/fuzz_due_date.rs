#![no_main]

use libfuzzer_sys::fuzz_target;
use studentdesk::service::parse_due_date;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (invalid UTF-8 becomes replacement chars)
    let text = String::from_utf8_lossy(data);

    // Any input either parses or is rejected - never panics
    let _ = parse_due_date(&text);
});
