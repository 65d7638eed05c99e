// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{
    Commerce, EntityId, PageRequest, Panier, Product, encode_cursor,
};

use super::{
    build_test_product, create_test_commerce, create_test_panier, create_test_persistence,
    create_test_product,
};
use crate::{PageSlice, PanierFilter, Persistence, PersistenceError, ProductFilter};

#[test]
fn test_products_page_by_cursor() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let first: Product = create_test_product(&mut persistence, &commerce.id, "Carrots", 250);
    let second: Product = create_test_product(&mut persistence, &commerce.id, "Leeks", 300);
    let third: Product = create_test_product(&mut persistence, &commerce.id, "Onions", 180);

    let filter: ProductFilter = ProductFilter {
        commerce_id: Some(commerce.id.clone()),
        ..ProductFilter::default()
    };

    let page_one: PageSlice<Product> = persistence
        .list_products(&filter, &PageRequest::new(Some(2), None).unwrap())
        .unwrap();
    assert_eq!(page_one.total_count, 3);
    assert_eq!(page_one.items.len(), 3);
    assert_eq!(page_one.items[0].id, first.id);
    assert_eq!(page_one.items[1].id, second.id);

    let cursor: String = encode_cursor(&second.id);
    let page_two: PageSlice<Product> = persistence
        .list_products(&filter, &PageRequest::new(Some(2), Some(&cursor)).unwrap())
        .unwrap();
    assert_eq!(page_two.total_count, 3, "total ignores the cursor");
    assert_eq!(page_two.items.len(), 1);
    assert_eq!(page_two.items[0].id, third.id);
}

#[test]
fn test_products_filter_by_tag_category_and_availability() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");

    let mut bread: Product = build_test_product(&commerce.id, "Bread", 400);
    bread.category = String::from("bakery");
    bread.tags = vec![String::from("fresh_daily")];
    let mut cheese: Product = build_test_product(&commerce.id, "Cheese", 900);
    cheese.is_available = false;
    persistence
        .create_products(&[bread.clone(), cheese.clone()])
        .unwrap();

    let page: PageRequest = PageRequest::new(None, None).unwrap();

    let bakery: PageSlice<Product> = persistence
        .list_products(
            &ProductFilter {
                category: Some(String::from("bakery")),
                ..ProductFilter::default()
            },
            &page,
        )
        .unwrap();
    assert_eq!(bakery.items.len(), 1);
    assert_eq!(bakery.items[0].id, bread.id);

    let tagged: PageSlice<Product> = persistence
        .list_products(
            &ProductFilter {
                tag: Some(String::from("fresh_daily")),
                ..ProductFilter::default()
            },
            &page,
        )
        .unwrap();
    assert_eq!(tagged.total_count, 1);

    let wildcard: PageSlice<Product> = persistence
        .list_products(
            &ProductFilter {
                tag: Some(String::from("fresh%")),
                ..ProductFilter::default()
            },
            &page,
        )
        .unwrap();
    assert_eq!(wildcard.total_count, 0, "LIKE wildcards in tags are literal");

    let available: PageSlice<Product> = persistence
        .list_products(
            &ProductFilter {
                is_available: Some(true),
                ..ProductFilter::default()
            },
            &page,
        )
        .unwrap();
    assert_eq!(available.total_count, 1);
    assert_eq!(available.items[0].id, bread.id);
}

#[test]
fn test_create_products_is_all_or_nothing() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");

    let good: Product = build_test_product(&commerce.id, "Apples", 320);
    let orphan: Product = build_test_product(&EntityId::generate(), "Pears", 340);

    let result: Result<(), PersistenceError> = persistence.create_products(&[good.clone(), orphan]);

    assert!(result.is_err());
    assert!(persistence.get_product_by_id(&good.id).unwrap().is_none());
}

#[test]
fn test_update_products_rejects_unknown_product() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let mut stored: Product = create_test_product(&mut persistence, &commerce.id, "Kale", 210);

    stored.price = 260;
    let missing: Product = build_test_product(&commerce.id, "Ghost", 100);
    let result: Result<(), PersistenceError> =
        persistence.update_products(&[stored.clone(), missing]);

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    let reloaded: Product = persistence.get_product_by_id(&stored.id).unwrap().unwrap();
    assert_eq!(reloaded.price, 210, "the batch was rolled back");
}

#[test]
fn test_get_products_by_ids_skips_unknown() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Beets", 150);

    let found: Vec<Product> = persistence
        .get_products_by_ids(&[product.id.clone(), EntityId::generate()])
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0], product);
}

#[test]
fn test_panier_round_trips_and_filters_by_stock() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Squash", 500);

    let stocked: Panier = create_test_panier(&mut persistence, &commerce.id, &product.id, 4);
    let sold_out: Panier = create_test_panier(&mut persistence, &commerce.id, &product.id, 0);

    let reloaded: Panier = persistence.get_panier_by_id(&stocked.id).unwrap().unwrap();
    assert_eq!(reloaded, stocked);

    let page: PageRequest = PageRequest::new(None, None).unwrap();
    let in_stock: PageSlice<Panier> = persistence
        .list_paniers(
            &PanierFilter {
                commerce_id: Some(commerce.id.clone()),
                in_stock: Some(true),
            },
            &page,
        )
        .unwrap();
    assert_eq!(in_stock.total_count, 1);
    assert_eq!(in_stock.items[0].id, stocked.id);

    let out_of_stock: PageSlice<Panier> = persistence
        .list_paniers(
            &PanierFilter {
                commerce_id: None,
                in_stock: Some(false),
            },
            &page,
        )
        .unwrap();
    assert_eq!(out_of_stock.items[0].id, sold_out.id);
}

#[test]
fn test_update_panier_writes_quantity() {
    let mut persistence: Persistence = create_test_persistence();
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Fennel", 350);
    let mut panier: Panier = create_test_panier(&mut persistence, &commerce.id, &product.id, 2);

    panier.quantity = 10;
    panier.name = String::from("Family basket");
    persistence.update_panier(&panier).unwrap();

    let reloaded: Panier = persistence.get_panier_by_id(&panier.id).unwrap().unwrap();
    assert_eq!(reloaded.quantity, 10);
    assert_eq!(reloaded.name, "Family basket");
}
