// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{
    CcCommand, Command, CommandStatus, Commerce, CommerceCommand, PageRequest, Panier,
    PanierCommand, Product, Role, User,
};

use super::{
    build_test_command, build_test_part, create_test_checkout, create_test_commerce,
    create_test_panier, create_test_persistence, create_test_product, create_test_user,
};
use crate::{
    CheckoutData, CommandFilter, CommerceCommandFilter, PageSlice, Persistence, PersistenceError,
};

#[test]
fn test_checkout_writes_every_record() {
    let mut persistence: Persistence = create_test_persistence();
    let buyer: User = create_test_user(&mut persistence, "buyer@example.com", Role::User);
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Eggs", 420);
    let panier: Panier = create_test_panier(&mut persistence, &commerce.id, &product.id, 5);

    let command: Command = build_test_command(&buyer.id);
    let part = build_test_part(&command, &commerce.id, Some(&product), &[(&panier, 2)]);
    let checkout: CheckoutData = CheckoutData {
        command: command.clone(),
        parts: vec![part.clone()],
    };
    persistence.create_checkout(&checkout).unwrap();

    let stored: Command = persistence.get_command_by_id(&command.id).unwrap().unwrap();
    assert_eq!(stored.status, CommandStatus::InProgress);

    let commerce_command: CommerceCommand = persistence
        .get_commerce_command_by_id(&part.commerce_command.id)
        .unwrap()
        .unwrap();
    assert_eq!(commerce_command.price, 420 + 2 * 1_800);

    let page: PageRequest = PageRequest::new(None, None).unwrap();
    let cc: PageSlice<CcCommand> = persistence
        .list_cc_commands(&commerce_command.id, &page)
        .unwrap();
    assert_eq!(cc.total_count, 1);
    assert_eq!(cc.items[0].items[0].product_id, product.id);

    let panier_lines: PageSlice<PanierCommand> = persistence
        .list_panier_commands(&commerce_command.id, &page)
        .unwrap();
    assert_eq!(panier_lines.items.len(), 1);
    assert_eq!(panier_lines.items[0].quantity, 2);

    let remaining: Panier = persistence.get_panier_by_id(&panier.id).unwrap().unwrap();
    assert_eq!(remaining.quantity, 3);
}

#[test]
fn test_checkout_with_insufficient_panier_quantity_keeps_nothing() {
    let mut persistence: Persistence = create_test_persistence();
    let buyer: User = create_test_user(&mut persistence, "buyer@example.com", Role::User);
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Milk", 130);
    let panier: Panier = create_test_panier(&mut persistence, &commerce.id, &product.id, 1);

    let command: Command = build_test_command(&buyer.id);
    let part = build_test_part(&command, &commerce.id, Some(&product), &[(&panier, 2)]);
    let result: Result<(), PersistenceError> = persistence.create_checkout(&CheckoutData {
        command: command.clone(),
        parts: vec![part],
    });

    assert_eq!(
        result,
        Err(PersistenceError::InsufficientQuantity {
            panier_id: panier.id.to_string(),
            requested: 2,
            available: 1,
        })
    );
    assert!(persistence.get_command_by_id(&command.id).unwrap().is_none());
    let untouched: Panier = persistence.get_panier_by_id(&panier.id).unwrap().unwrap();
    assert_eq!(untouched.quantity, 1);
}

#[test]
fn test_status_update_refreshes_command_aggregate() {
    let mut persistence: Persistence = create_test_persistence();
    let buyer: User = create_test_user(&mut persistence, "buyer@example.com", Role::User);
    let bakery: Commerce = create_test_commerce(&mut persistence, "bakery@example.com");
    let dairy: Commerce = create_test_commerce(&mut persistence, "dairy@example.com");
    let bread: Product = create_test_product(&mut persistence, &bakery.id, "Bread", 300);
    let butter: Product = create_test_product(&mut persistence, &dairy.id, "Butter", 450);

    let checkout: CheckoutData = create_test_checkout(
        &mut persistence,
        &buyer.id,
        &[(&bakery.id, &bread), (&dairy.id, &butter)],
    );
    let first = &checkout.parts[0].commerce_command;
    let second = &checkout.parts[1].commerce_command;

    let (_, aggregate) = persistence
        .update_commerce_command_status(&first.id, CommandStatus::Ready)
        .unwrap();
    assert_eq!(aggregate, CommandStatus::InProgress);

    let (updated, aggregate) = persistence
        .update_commerce_command_status(&second.id, CommandStatus::Ready)
        .unwrap();
    assert_eq!(updated.status, CommandStatus::Ready);
    assert_eq!(aggregate, CommandStatus::Ready);

    let command: Command = persistence
        .get_command_by_id(&checkout.command.id)
        .unwrap()
        .unwrap();
    assert_eq!(command.status, CommandStatus::Ready);
    assert_eq!(
        persistence.get_child_statuses(&command.id).unwrap(),
        vec![CommandStatus::Ready, CommandStatus::Ready]
    );
}

#[test]
fn test_invalid_status_transition_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();
    let buyer: User = create_test_user(&mut persistence, "buyer@example.com", Role::User);
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Honey", 800);
    let checkout: CheckoutData =
        create_test_checkout(&mut persistence, &buyer.id, &[(&commerce.id, &product)]);
    let commerce_command_id = checkout.parts[0].commerce_command.id.clone();

    persistence
        .update_commerce_command_status(&commerce_command_id, CommandStatus::Canceled)
        .unwrap();
    let result = persistence
        .update_commerce_command_status(&commerce_command_id, CommandStatus::Ready);

    assert!(matches!(result, Err(PersistenceError::DomainViolation(_))));
    let command: Command = persistence
        .get_command_by_id(&checkout.command.id)
        .unwrap()
        .unwrap();
    assert_eq!(command.status, CommandStatus::Canceled);
}

#[test]
fn test_list_commands_and_commerce_commands_are_scoped() {
    let mut persistence: Persistence = create_test_persistence();
    let alice: User = create_test_user(&mut persistence, "alice@example.com", Role::User);
    let bob: User = create_test_user(&mut persistence, "bob@example.com", Role::User);
    let commerce: Commerce = create_test_commerce(&mut persistence, "shop@example.com");
    let other: Commerce = create_test_commerce(&mut persistence, "other@example.com");
    let product: Product = create_test_product(&mut persistence, &commerce.id, "Jam", 560);
    let other_product: Product = create_test_product(&mut persistence, &other.id, "Tea", 700);

    create_test_checkout(&mut persistence, &alice.id, &[(&commerce.id, &product)]);
    create_test_checkout(&mut persistence, &alice.id, &[(&other.id, &other_product)]);
    create_test_checkout(&mut persistence, &bob.id, &[(&commerce.id, &product)]);

    let page: PageRequest = PageRequest::new(None, None).unwrap();

    let alice_commands: PageSlice<Command> = persistence
        .list_commands(
            &CommandFilter {
                user_id: Some(alice.id.clone()),
            },
            &page,
        )
        .unwrap();
    assert_eq!(alice_commands.total_count, 2);

    let all_commands: PageSlice<Command> = persistence
        .list_commands(&CommandFilter::default(), &page)
        .unwrap();
    assert_eq!(all_commands.total_count, 3);

    let shop_orders: PageSlice<CommerceCommand> = persistence
        .list_commerce_commands(
            &CommerceCommandFilter {
                commerce_id: Some(commerce.id.clone()),
                ..CommerceCommandFilter::default()
            },
            &page,
        )
        .unwrap();
    assert_eq!(shop_orders.total_count, 2);
    assert!(shop_orders.items.iter().all(|cc| cc.commerce_id == commerce.id));

    let ready_orders: PageSlice<CommerceCommand> = persistence
        .list_commerce_commands(
            &CommerceCommandFilter {
                status: Some(CommandStatus::Ready),
                ..CommerceCommandFilter::default()
            },
            &page,
        )
        .unwrap();
    assert_eq!(ready_orders.total_count, 0);
}
