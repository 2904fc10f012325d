//! Allocation bounds while walking large documents
//!
//! Run with: cargo test --features memory_tracking --test memory

#![cfg(feature = "memory_tracking")]

use xmlscanf::{memory, Arg, Document, Options};

const ITEMS: usize = 50_000;
const HEADROOM: usize = 64 * 1024;

#[test]
fn test_flat_walk_has_bounded_peak() {
    let mut xml = String::with_capacity(ITEMS * 24);
    xml.push_str("<?xml version=\"1.0\"?><items>");
    for i in 0..ITEMS {
        xml.push_str(&format!("<item n='{i}'>{i}</item>"));
    }
    xml.push_str("</items>");
    let len = xml.len();

    let mut doc = Document::from_bytes(xml, Options::REQUIRE_XML_DECLARATION).unwrap();
    let root = doc.root();
    let items = doc.query(root, "^e", &mut [Arg::Name("items")]).unwrap().unwrap();

    let (baseline, _) = memory::reset_peak();
    let mut value = 0u32;
    let mut count = 0;
    while doc
        .query(items, "^oe%u", &mut [Arg::Name("item"), Arg::U32(&mut value)])
        .unwrap()
        .is_some()
    {
        assert_eq!(value as usize, count);
        count += 1;
    }
    let peak = memory::peak();

    assert_eq!(count, ITEMS);
    assert!(
        peak - baseline < HEADROOM,
        "peak grew by {} bytes over a {} byte document",
        peak - baseline,
        len
    );
}
