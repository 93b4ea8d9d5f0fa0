#![no_main]

use libfuzzer_sys::fuzz_target;
use mockupsim::contact::ContactLinks;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(links) = ContactLinks::new("5512983173077") else {
        return;
    };

    let link = links.link(message);
    let (_, query) = link.split_once("?text=").unwrap_or_default();

    // Encoded text must never carry characters that end or split the query
    assert!(!query.contains(['&', '#', ' ', '?', '=']));
});
