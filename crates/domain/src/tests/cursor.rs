// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    DEFAULT_PAGE_SIZE, DomainError, EntityId, MAX_PAGE_SIZE, PageRequest, decode_cursor,
    encode_cursor,
};

#[test]
fn test_cursor_decodes_to_the_encoded_identifier() {
    let id: EntityId = EntityId::generate();
    let cursor: String = encode_cursor(&id);
    assert_ne!(cursor, id.as_str());
    assert_eq!(decode_cursor(&cursor).unwrap(), id);
}

#[test]
fn test_cursor_is_standard_base64_of_hex() {
    let id: EntityId = EntityId::parse("000000000000000000000001").unwrap();
    assert_eq!(encode_cursor(&id), "MDAwMDAwMDAwMDAwMDAwMDAwMDAwMDAx");
}

#[test]
fn test_decode_rejects_non_base64() {
    assert!(matches!(
        decode_cursor("not a cursor!"),
        Err(DomainError::InvalidCursor(_))
    ));
}

#[test]
fn test_decode_rejects_base64_of_non_identifier() {
    // "hello"
    assert!(matches!(
        decode_cursor("aGVsbG8="),
        Err(DomainError::InvalidCursor(_))
    ));
}

#[test]
fn test_page_request_defaults() {
    let page: PageRequest = PageRequest::new(None, None).unwrap();
    assert_eq!(page.first, DEFAULT_PAGE_SIZE);
    assert_eq!(page.after, None);
    assert_eq!(page.fetch_limit(), DEFAULT_PAGE_SIZE + 1);
}

#[test]
fn test_page_request_bounds() {
    assert!(PageRequest::new(Some(1), None).is_ok());
    assert!(PageRequest::new(Some(MAX_PAGE_SIZE), None).is_ok());
    assert_eq!(
        PageRequest::new(Some(0), None),
        Err(DomainError::InvalidPageSize {
            requested: 0,
            max: MAX_PAGE_SIZE,
        })
    );
    assert!(PageRequest::new(Some(MAX_PAGE_SIZE + 1), None).is_err());
    assert!(PageRequest::new(Some(-3), None).is_err());
}

#[test]
fn test_page_request_empty_cursor_means_first_page() {
    let page: PageRequest = PageRequest::new(Some(5), Some("")).unwrap();
    assert_eq!(page.after, None);
}

#[test]
fn test_page_request_decodes_cursor() {
    let id: EntityId = EntityId::generate();
    let page: PageRequest = PageRequest::new(Some(2), Some(&encode_cursor(&id))).unwrap();
    assert_eq!(page.after, Some(id));
}
