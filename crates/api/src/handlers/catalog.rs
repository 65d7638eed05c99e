// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::{BTreeSet, HashMap};

use localmarket_domain::{
    Commerce, EntityId, PageRequest, Panier, PanierItem, Product, Role, apply_panier_patch,
    apply_product_patch, current_timestamp, validate_panier, validate_product,
};
use localmarket_persistence::{PageSlice, PanierFilter, Persistence, ProductFilter};
use tracing::{debug, info};

use super::{load_commerce, page_request, parse_id, parse_optional_id};
use crate::auth::{AuthenticatedUser, AuthorizationService};
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::pagination::Connection;
use crate::request_response::{
    CreatePanierRequest, CreateProductRequest, CreateProductsRequest, IdRequest,
    ListPaniersRequest, ListProductsRequest, PanierConnection, PanierView, ProductConnection,
    ProductInput, ProductView, UpdatePanierRequest, UpdateProductRequest, UpdateProductsRequest,
};

/// Resolves the commerce a storekeeper or administrator acts under.
///
/// Storekeepers always act under their own commerce; administrators must
/// name one.
fn resolve_commerce(
    persistence: &mut Persistence,
    caller: &AuthenticatedUser,
    requested: Option<&str>,
    action: &str,
) -> Result<Commerce, ApiError> {
    AuthorizationService::require_role(caller, Role::Storekeeper, action)?;
    let requested: Option<EntityId> = parse_optional_id("commerceId", requested)?;

    if caller.is_admin() {
        let commerce_id: EntityId = requested.ok_or_else(|| ApiError::InvalidInput {
            field: String::from("commerceId"),
            message: String::from("An administrator must name the commerce"),
        })?;
        return load_commerce(persistence, &commerce_id);
    }

    let commerce: Commerce = persistence
        .get_commerce_by_storekeeper(&caller.id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Commerce"),
            message: format!("Storekeeper {} has no commerce", caller.id),
        })?;

    if requested.is_some_and(|id| id != commerce.id) {
        return Err(ApiError::Unauthorized {
            action: action.to_string(),
            required_role: String::from("the commerce owner or ADMIN"),
        });
    }
    Ok(commerce)
}

/// Prefixes the field of an input error with its position in a batch.
fn at_index(collection: &str, index: usize, err: ApiError) -> ApiError {
    match err {
        ApiError::InvalidInput { field, message } => ApiError::InvalidInput {
            field: format!("{collection}[{index}].{field}"),
            message,
        },
        other => other,
    }
}

fn build_product(commerce_id: &EntityId, input: ProductInput) -> Product {
    Product {
        id: EntityId::generate(),
        commerce_id: commerce_id.clone(),
        name: input.name,
        description: input.description,
        price: input.price,
        tax_rate: input.tax_rate,
        category: input.category,
        tags: input.tags,
        image: input.image,
        is_available: input.is_available,
        created_at: current_timestamp(),
    }
}

fn load_product(persistence: &mut Persistence, product_id: &EntityId) -> Result<Product, ApiError> {
    persistence
        .get_product_by_id(product_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("Product", product_id))
}

fn load_panier(persistence: &mut Persistence, panier_id: &EntityId) -> Result<Panier, ApiError> {
    persistence
        .get_panier_by_id(panier_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("Panier", panier_id))
}

/// Checks that every panier item references a product of the commerce.
fn check_panier_items(
    persistence: &mut Persistence,
    commerce_id: &EntityId,
    items: &[PanierItem],
) -> Result<(), ApiError> {
    let ids: Vec<EntityId> = items.iter().map(|item| item.product_id.clone()).collect();
    let owners: HashMap<EntityId, EntityId> = persistence
        .get_products_by_ids(&ids)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(|product| (product.id, product.commerce_id))
        .collect();

    for item in items {
        if owners.get(&item.product_id) != Some(commerce_id) {
            return Err(ApiError::InvalidInput {
                field: String::from("items"),
                message: format!(
                    "Product {} is not sold by commerce {commerce_id}",
                    item.product_id
                ),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Products
// ============================================================================

/// Creates one product under the caller's commerce.
///
/// # Errors
///
/// Returns an error if the caller may not act under the commerce or the
/// product is invalid.
pub fn create_product(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: CreateProductRequest,
) -> Result<ProductView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "create_product")?;
    let commerce: Commerce = resolve_commerce(
        persistence,
        caller,
        request.commerce_id.as_deref(),
        "create_product",
    )?;

    let product: Product = build_product(&commerce.id, request.product);
    validate_product(&product).map_err(translate_domain_error)?;

    persistence
        .create_products(std::slice::from_ref(&product))
        .map_err(translate_persistence_error)?;

    info!(product_id = %product.id, commerce_id = %commerce.id, "Created product");
    Ok(ProductView::from(&product))
}

/// Creates several products under one commerce, all or nothing.
///
/// Every product is validated before any is written.
///
/// # Errors
///
/// Returns an error if the list is empty, the caller may not act under the
/// commerce, or any product is invalid. Field errors name the product's
/// position, e.g. `products[2].price`.
pub fn create_products(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: CreateProductsRequest,
) -> Result<Vec<ProductView>, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "create_products")?;
    let commerce: Commerce = resolve_commerce(
        persistence,
        caller,
        request.commerce_id.as_deref(),
        "create_products",
    )?;

    if request.products.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("products"),
            message: String::from("At least one product is required"),
        });
    }

    let products: Vec<Product> = request
        .products
        .into_iter()
        .map(|input| build_product(&commerce.id, input))
        .collect();
    for (index, product) in products.iter().enumerate() {
        validate_product(product)
            .map_err(|e| at_index("products", index, translate_domain_error(e)))?;
    }

    persistence
        .create_products(&products)
        .map_err(translate_persistence_error)?;

    info!(
        commerce_id = %commerce.id,
        count = products.len(),
        "Created products"
    );
    Ok(products.iter().map(ProductView::from).collect())
}

/// Loads, authorizes and patches one product without writing it.
fn patched_product(
    persistence: &mut Persistence,
    caller: &AuthenticatedUser,
    request: &UpdateProductRequest,
    action: &str,
) -> Result<Product, ApiError> {
    let product_id: EntityId = parse_id("id", &request.id)?;
    let mut product: Product = load_product(persistence, &product_id)?;
    let commerce: Commerce = load_commerce(persistence, &product.commerce_id)?;
    AuthorizationService::require_commerce_owner(caller, &commerce, action)?;

    apply_product_patch(&mut product, &request.patch).map_err(translate_domain_error)?;
    Ok(product)
}

/// Updates one product.
///
/// # Errors
///
/// Returns an error if the product does not exist, the caller does not own
/// its commerce, or the patch is invalid.
pub fn update_product(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &UpdateProductRequest,
) -> Result<ProductView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "update_product")?;
    let product: Product = patched_product(persistence, caller, request, "update_product")?;

    persistence
        .update_products(std::slice::from_ref(&product))
        .map_err(translate_persistence_error)?;

    info!(product_id = %product.id, actor = %caller.id, "Updated product");
    Ok(ProductView::from(&product))
}

/// Updates several products, all or nothing.
///
/// # Errors
///
/// Returns an error if the list is empty or names a product twice, or if
/// any single update would fail.
pub fn update_products(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &UpdateProductsRequest,
) -> Result<Vec<ProductView>, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "update_products")?;

    if request.products.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("products"),
            message: String::from("At least one product is required"),
        });
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut products: Vec<Product> = Vec::with_capacity(request.products.len());
    for (index, update) in request.products.iter().enumerate() {
        if !seen.insert(update.id.as_str()) {
            return Err(ApiError::InvalidInput {
                field: format!("products[{index}].id"),
                message: format!("Product {} is listed twice", update.id),
            });
        }
        let product: Product = patched_product(persistence, caller, update, "update_products")
            .map_err(|e| at_index("products", index, e))?;
        products.push(product);
    }

    persistence
        .update_products(&products)
        .map_err(translate_persistence_error)?;

    info!(actor = %caller.id, count = products.len(), "Updated products");
    Ok(products.iter().map(ProductView::from).collect())
}

/// Reads a product. Public.
///
/// # Errors
///
/// Returns an error if the identifier is malformed or the product does not
/// exist.
pub fn get_product(
    persistence: &mut Persistence,
    request: &IdRequest,
) -> Result<ProductView, ApiError> {
    let product_id: EntityId = parse_id("id", &request.id)?;
    debug!(product_id = %product_id, "Reading product");
    Ok(ProductView::from(&load_product(persistence, &product_id)?))
}

/// Lists products. Public.
///
/// # Errors
///
/// Returns an error if an argument is malformed.
pub fn list_products(
    persistence: &mut Persistence,
    request: &ListProductsRequest,
) -> Result<ProductConnection, ApiError> {
    let page: PageRequest = page_request(&request.page)?;
    let filter: ProductFilter = ProductFilter {
        commerce_id: parse_optional_id("commerceId", request.commerce_id.as_deref())?,
        category: request.category.clone(),
        tag: request.tag.clone(),
        is_available: request.is_available,
    };
    debug!(?filter, first = page.first, "Listing products");

    let slice: PageSlice<Product> = persistence
        .list_products(&filter, &page)
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |product| &product.id,
        |product| ProductView::from(&product),
    ))
}

// ============================================================================
// Paniers
// ============================================================================

/// Creates a panier under the caller's commerce.
///
/// # Errors
///
/// Returns an error if the caller may not act under the commerce, the
/// panier is invalid, or an item is not a product of the commerce.
pub fn create_panier(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: CreatePanierRequest,
) -> Result<PanierView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "create_panier")?;
    let commerce: Commerce = resolve_commerce(
        persistence,
        caller,
        request.commerce_id.as_deref(),
        "create_panier",
    )?;

    let panier: Panier = Panier {
        id: EntityId::generate(),
        commerce_id: commerce.id.clone(),
        name: request.name,
        description: request.description,
        price: request.price,
        items: request.items,
        quantity: request.quantity,
        image: request.image,
        created_at: current_timestamp(),
    };
    validate_panier(&panier).map_err(translate_domain_error)?;
    check_panier_items(persistence, &commerce.id, &panier.items)?;

    persistence
        .create_panier(&panier)
        .map_err(translate_persistence_error)?;

    info!(panier_id = %panier.id, commerce_id = %commerce.id, "Created panier");
    Ok(PanierView::from(&panier))
}

/// Updates a panier.
///
/// # Errors
///
/// Returns an error if the panier does not exist, the caller does not own
/// its commerce, the patch is invalid, or a new item is not a product of
/// the commerce.
pub fn update_panier(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &UpdatePanierRequest,
) -> Result<PanierView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "update_panier")?;
    let panier_id: EntityId = parse_id("id", &request.id)?;

    let mut panier: Panier = load_panier(persistence, &panier_id)?;
    let commerce: Commerce = load_commerce(persistence, &panier.commerce_id)?;
    AuthorizationService::require_commerce_owner(caller, &commerce, "update_panier")?;

    apply_panier_patch(&mut panier, &request.patch).map_err(translate_domain_error)?;
    if request.patch.items.is_some() {
        check_panier_items(persistence, &commerce.id, &panier.items)?;
    }

    persistence
        .update_panier(&panier)
        .map_err(translate_persistence_error)?;

    info!(panier_id = %panier.id, actor = %caller.id, "Updated panier");
    Ok(PanierView::from(&panier))
}

/// Reads a panier. Public.
///
/// # Errors
///
/// Returns an error if the identifier is malformed or the panier does not
/// exist.
pub fn get_panier(
    persistence: &mut Persistence,
    request: &IdRequest,
) -> Result<PanierView, ApiError> {
    let panier_id: EntityId = parse_id("id", &request.id)?;
    debug!(panier_id = %panier_id, "Reading panier");
    Ok(PanierView::from(&load_panier(persistence, &panier_id)?))
}

/// Lists paniers. Public.
///
/// # Errors
///
/// Returns an error if an argument is malformed.
pub fn list_paniers(
    persistence: &mut Persistence,
    request: &ListPaniersRequest,
) -> Result<PanierConnection, ApiError> {
    let page: PageRequest = page_request(&request.page)?;
    let filter: PanierFilter = PanierFilter {
        commerce_id: parse_optional_id("commerceId", request.commerce_id.as_deref())?,
        in_stock: request.in_stock,
    };
    debug!(?filter, first = page.first, "Listing paniers");

    let slice: PageSlice<Panier> = persistence
        .list_paniers(&filter, &page)
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |panier| &panier.id,
        |panier| PanierView::from(&panier),
    ))
}
