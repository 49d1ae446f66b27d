//! End-to-end offer scenarios on the sandbox chain
//!
//! Every test drives real wallets, items and the offer contract through
//! message delivery and asserts exact nano-unit balances afterwards.

use contracts::cell::Cell;
use contracts::getters::StackValue;
use contracts::items::ItemList;
use contracts::message::{accept_offer_body, cancel_offer_body, confirm_offer_body, op_body};
use proptest::prelude::*;
use simulation::chain::Blockchain;
use simulation::fixtures::{accept_stage, deploy_offer, init_items, Parties};
use simulation::scenario::{run_offer_traffic, TrafficConfig};
use simulation::transaction::{SendResult, TxFilter};
use types::address::Address;
use types::coins::Coins;
use types::errors::ExitCode;
use types::offer::OfferStatus;
use types::op;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn coins(units: &str) -> Coins {
    units.parse().unwrap()
}

/// Signed wallet change in nano-units.
fn delta(chain: &Blockchain, wallet: &Address, before: Coins) -> i128 {
    chain.wallet_balance(wallet).nano() as i128 - before.nano() as i128
}

fn nano(units: &str) -> i128 {
    coins(units).nano() as i128
}

struct Snapshot {
    first: Coins,
    second: Coins,
    admin: Coins,
    fee_recipient_1: Coins,
    fee_recipient_2: Coins,
}

fn snapshot(chain: &Blockchain, parties: &Parties) -> Snapshot {
    Snapshot {
        first: chain.wallet_balance(&parties.first),
        second: chain.wallet_balance(&parties.second),
        admin: chain.wallet_balance(&parties.admin),
        fee_recipient_1: chain.wallet_balance(&parties.fee_recipient_1),
        fee_recipient_2: chain.wallet_balance(&parties.fee_recipient_2),
    }
}

/// 3 items and 100 units against 6 items and 50 units, accepted.
struct Accepted {
    chain: Blockchain,
    parties: Parties,
    offer: Address,
    first_items: Vec<Address>,
    second_items: Vec<Address>,
    before: Snapshot,
}

fn setup_accepted() -> Accepted {
    init_tracing();
    let mut chain = Blockchain::new();
    let parties = Parties::setup(&mut chain);
    let first_items = init_items(&mut chain, parties.first, "first", 3).unwrap();
    let second_items = init_items(&mut chain, parties.second, "second", 6).unwrap();
    let before = snapshot(&chain, &parties);

    let offer = deploy_offer(&mut chain, &parties, coins("100"), &first_items).unwrap();
    let accepted = accept_stage(&mut chain, offer, parties.second, coins("50"), &second_items).unwrap();
    assert_eq!(accepted.failures().count(), 0);
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::WaitConfirm);

    Accepted {
        chain,
        parties,
        offer,
        first_items: first_items.addresses().to_vec(),
        second_items: second_items.addresses().to_vec(),
        before,
    }
}

fn rejected_with(result: &SendResult, to: Address, code: ExitCode) -> bool {
    result.has_transaction(&TxFilter {
        to: Some(to),
        success: Some(false),
        exit_code: Some(code.code()),
        ..Default::default()
    })
}

// ═══════════════════════════════════════════════════════════════════
// Complete Swap
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_swap_3_items_for_6_items() {
    let Accepted {
        mut chain,
        parties,
        offer,
        first_items,
        second_items,
        before,
    } = setup_accepted();
    assert_eq!(chain.offer(&offer).unwrap().balance(), coins("151.2"));
    let total = chain.total_value();

    let result = chain
        .send(parties.first, offer, Coins::ZERO, confirm_offer_body().unwrap())
        .unwrap();
    assert_eq!(result.failures().count(), 0);
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.fee_recipient_1),
        value: Some(coins("0.06")),
        ..Default::default()
    }));
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.fee_recipient_2),
        value: Some(coins("0.14")),
        ..Default::default()
    }));
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.second),
        value: Some(coins("100.2")),
        ..Default::default()
    }));
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.first),
        value: Some(coins("50.35")),
        ..Default::default()
    }));

    for item in &first_items {
        assert_eq!(chain.item_owner(item), Some(parties.second));
    }
    for item in &second_items {
        assert_eq!(chain.item_owner(item), Some(parties.first));
    }

    let contract = chain.offer(&offer).unwrap();
    assert_eq!(contract.get_status(), OfferStatus::OfferCompleted);
    assert!(contract.balance().is_zero());
    assert_eq!(chain.items_owned_by(&offer), 0);
    assert_eq!(chain.total_value(), total);

    // item forwarding excess lands with the new owner
    assert_eq!(delta(&chain, &parties.first, before.first), -nano("49.95"));
    assert_eq!(delta(&chain, &parties.second, before.second), nano("49.75"));
    assert_eq!(
        delta(&chain, &parties.fee_recipient_1, before.fee_recipient_1),
        nano("0.06")
    );
    assert_eq!(
        delta(&chain, &parties.fee_recipient_2, before.fee_recipient_2),
        nano("0.14")
    );
}

#[test]
fn test_fee_pool_split_30_70() {
    let Accepted {
        mut chain,
        parties,
        offer,
        ..
    } = setup_accepted();
    let result = chain
        .send(parties.first, offer, Coins::ZERO, confirm_offer_body().unwrap())
        .unwrap();

    let to_1 = result.count(&TxFilter {
        to: Some(parties.fee_recipient_1),
        ..Default::default()
    });
    let to_2 = result.count(&TxFilter {
        to: Some(parties.fee_recipient_2),
        ..Default::default()
    });
    assert_eq!((to_1, to_2), (1, 1));
    let paid_1 = result.received_by(&parties.fee_recipient_1).unwrap();
    let paid_2 = result.received_by(&parties.fee_recipient_2).unwrap();
    assert_eq!(paid_1.checked_add(paid_2), Some(coins("0.2")));
    assert_eq!(paid_1.nano() * 10, paid_1.checked_add(paid_2).unwrap().nano() * 3);
}

// ═══════════════════════════════════════════════════════════════════
// Cancellation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_first_party_cancels_before_acceptance() {
    init_tracing();
    let mut chain = Blockchain::new();
    let parties = Parties::setup(&mut chain);
    let items = init_items(&mut chain, parties.first, "first", 3).unwrap();
    let before = snapshot(&chain, &parties);

    let offer = deploy_offer(&mut chain, &parties, coins("100"), &items).unwrap();
    assert_eq!(chain.items_owned_by(&offer), 3);

    let result = chain
        .send(parties.first, offer, Coins::ZERO, cancel_offer_body().unwrap())
        .unwrap();
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.first),
        value: Some(coins("100.45")),
        ..Default::default()
    }));

    for item in items.addresses() {
        assert_eq!(chain.item_owner(item), Some(parties.first));
    }
    assert_eq!(chain.items_owned_by(&offer), 0);
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::OfferCanceled);
    assert_eq!(delta(&chain, &parties.first, before.first), 0);
}

#[test]
fn test_round_trip_leaves_no_custody() {
    for n in [1, 5, 10] {
        let mut chain = Blockchain::new();
        let parties = Parties::setup(&mut chain);
        let items = init_items(&mut chain, parties.first, &format!("round-{}", n), n).unwrap();
        let total = chain.total_value();

        let offer = deploy_offer(&mut chain, &parties, coins("1"), &items).unwrap();
        chain
            .send(parties.first, offer, Coins::ZERO, cancel_offer_body().unwrap())
            .unwrap();

        assert_eq!(chain.items_owned_by(&offer), 0, "n = {}", n);
        assert_eq!(chain.items_owned_by(&parties.first), n, "n = {}", n);
        assert!(chain.offer(&offer).unwrap().balance().is_zero());
        assert_eq!(chain.total_value(), total);
    }
}

#[test]
fn test_second_party_cancels_after_acceptance() {
    let Accepted {
        mut chain,
        parties,
        offer,
        before,
        ..
    } = setup_accepted();
    let result = chain
        .send(parties.second, offer, Coins::ZERO, cancel_offer_body().unwrap())
        .unwrap();
    assert_eq!(result.failures().count(), 0);
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.second),
        value: Some(coins("50.3")),
        ..Default::default()
    }));
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.first),
        value: Some(coins("100.45")),
        ..Default::default()
    }));
    assert_eq!(chain.items_owned_by(&parties.first), 3);
    assert_eq!(chain.items_owned_by(&parties.second), 6);
    assert_eq!(delta(&chain, &parties.first, before.first), 0);
    assert_eq!(delta(&chain, &parties.second, before.second), 0);
}

#[test]
fn test_admin_cancel_respects_deadline() {
    let Accepted {
        mut chain,
        parties,
        offer,
        before,
        ..
    } = setup_accepted();
    let delay = chain.config().admin_cancel_delay_secs;

    chain.advance(delay - 1);
    let early = chain
        .send(parties.admin, offer, Coins::ZERO, cancel_offer_body().unwrap())
        .unwrap();
    assert!(rejected_with(&early, offer, ExitCode::InvalidAddress));
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::WaitConfirm);

    chain.advance(1);
    let late = chain
        .send(parties.admin, offer, Coins::ZERO, cancel_offer_body().unwrap())
        .unwrap();
    assert_eq!(late.failures().count(), 0);
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::OfferCanceled);
    assert_eq!(chain.items_owned_by(&offer), 0);
    assert_eq!(delta(&chain, &parties.first, before.first), 0);
    assert_eq!(delta(&chain, &parties.second, before.second), 0);
    assert_eq!(delta(&chain, &parties.admin, before.admin), 0);
}

#[test]
fn test_admin_cannot_cancel_before_acceptance() {
    init_tracing();
    let mut chain = Blockchain::new();
    let parties = Parties::setup(&mut chain);
    let items = init_items(&mut chain, parties.first, "first", 1).unwrap();
    let offer = deploy_offer(&mut chain, &parties, coins("1"), &items).unwrap();

    chain.advance(10 * chain.config().admin_cancel_delay_secs);
    let result = chain
        .send(parties.admin, offer, Coins::ZERO, cancel_offer_body().unwrap())
        .unwrap();
    assert!(rejected_with(&result, offer, ExitCode::InvalidAddress));
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::WaitSecond);
}

// ═══════════════════════════════════════════════════════════════════
// Rejections
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_unauthorized_cancel_bounces() {
    let Accepted {
        mut chain, offer, ..
    } = setup_accepted();
    let stranger = chain.treasury("stranger");
    let before = chain.wallet_balance(&stranger);
    let total = chain.total_value();

    let result = chain
        .send(stranger, offer, coins("1"), cancel_offer_body().unwrap())
        .unwrap();
    assert!(rejected_with(&result, offer, ExitCode::InvalidAddress));
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(stranger),
        value: Some(coins("1")),
        success: Some(true),
        ..Default::default()
    }));
    assert_eq!(chain.wallet_balance(&stranger), before);
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::WaitConfirm);
    assert_eq!(chain.total_value(), total);
}

#[test]
fn test_second_accept_is_wrong_action() {
    let Accepted {
        mut chain, offer, ..
    } = setup_accepted();
    let late = chain.treasury("late user");
    let value = coins("10");
    let deposit = chain.config().fees.required_deposit(value).unwrap();
    let body = accept_offer_body(value, &ItemList::empty()).unwrap();

    let result = chain.send(late, offer, deposit, body).unwrap();
    assert!(rejected_with(&result, offer, ExitCode::WrongAction));
    assert_eq!(chain.offer(&offer).unwrap().balance(), coins("151.2"));
}

#[test]
fn test_confirm_by_second_party_rejected() {
    let Accepted {
        mut chain,
        parties,
        offer,
        ..
    } = setup_accepted();
    let result = chain
        .send(parties.second, offer, Coins::ZERO, confirm_offer_body().unwrap())
        .unwrap();
    assert!(rejected_with(&result, offer, ExitCode::InvalidAddress));
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::WaitConfirm);
}

#[test]
fn test_confirm_before_acceptance_is_wrong_action() {
    init_tracing();
    let mut chain = Blockchain::new();
    let parties = Parties::setup(&mut chain);
    let items = init_items(&mut chain, parties.first, "first", 2).unwrap();
    let offer = deploy_offer(&mut chain, &parties, coins("1"), &items).unwrap();

    let result = chain
        .send(parties.first, offer, Coins::ZERO, confirm_offer_body().unwrap())
        .unwrap();
    assert!(rejected_with(&result, offer, ExitCode::WrongAction));
    assert_eq!(chain.items_owned_by(&offer), 2);
}

#[test]
fn test_under_funded_accept_bounces() {
    init_tracing();
    let mut chain = Blockchain::new();
    let parties = Parties::setup(&mut chain);
    let items = init_items(&mut chain, parties.first, "first", 1).unwrap();
    let offer = deploy_offer(&mut chain, &parties, coins("1"), &items).unwrap();
    let before = chain.wallet_balance(&parties.second);

    let body = accept_offer_body(coins("5"), &ItemList::empty()).unwrap();
    let result = chain.send(parties.second, offer, coins("5.5"), body).unwrap();
    assert!(rejected_with(&result, offer, ExitCode::InvalidAmount));
    assert_eq!(chain.wallet_balance(&parties.second), before);
    assert_eq!(chain.offer(&offer).unwrap().get_status(), OfferStatus::WaitSecond);
}

#[test]
fn test_terminal_offer_rejects_top_up() {
    let Accepted {
        mut chain,
        parties,
        offer,
        ..
    } = setup_accepted();
    chain
        .send(parties.first, offer, Coins::ZERO, confirm_offer_body().unwrap())
        .unwrap();
    let before = chain.wallet_balance(&parties.first);

    let result = chain.send(parties.first, offer, coins("2"), Cell::empty()).unwrap();
    assert!(rejected_with(&result, offer, ExitCode::WrongAction));
    assert_eq!(chain.wallet_balance(&parties.first), before);
    assert!(chain.offer(&offer).unwrap().balance().is_zero());
}

#[test]
fn test_unknown_op_rejected() {
    let Accepted {
        mut chain,
        parties,
        offer,
        ..
    } = setup_accepted();
    let body = op_body(0x1234, 0).unwrap();
    let result = chain.send(parties.first, offer, coins("1"), body).unwrap();
    assert!(rejected_with(&result, offer, ExitCode::UnknownOp));
}

// ═══════════════════════════════════════════════════════════════════
// Get Methods & Notifications
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_named_get_methods() {
    let Accepted {
        mut chain,
        parties,
        offer,
        first_items,
        second_items,
        ..
    } = setup_accepted();

    assert_eq!(
        chain.run_get_method(&offer, "get_status", &[]).unwrap(),
        StackValue::Int(OfferStatus::WaitConfirm.code() as u128)
    );
    assert_eq!(
        chain.run_get_method(&offer, "get_smc_balance", &[]).unwrap(),
        StackValue::Int(coins("151.2").nano())
    );
    assert_eq!(
        chain
            .run_get_method(&offer, "get_creator_nft_address_by_index", &[1])
            .unwrap(),
        StackValue::Address(first_items[0])
    );
    assert_eq!(
        chain
            .run_get_method(&offer, "get_user_nft_address_by_index", &[6])
            .unwrap(),
        StackValue::Address(second_items[5])
    );
    assert!(chain
        .run_get_method(&offer, "get_user_nft_address_by_index", &[7])
        .is_err());

    chain
        .send(parties.first, offer, Coins::ZERO, confirm_offer_body().unwrap())
        .unwrap();
    assert_eq!(
        chain.run_get_method(&offer, "get_status", &[]).unwrap(),
        StackValue::Int(OfferStatus::OfferCompleted.code() as u128)
    );
    assert_eq!(
        chain.run_get_method(&offer, "get_smc_balance", &[]).unwrap(),
        StackValue::Int(0)
    );
}

#[test]
fn test_top_up_and_excesses_accepted_while_open() {
    init_tracing();
    let mut chain = Blockchain::new();
    let parties = Parties::setup(&mut chain);
    let items = init_items(&mut chain, parties.first, "first", 1).unwrap();
    let offer = deploy_offer(&mut chain, &parties, coins("1"), &items).unwrap();

    let stranger = chain.treasury("stranger");
    let top_up = chain.send(stranger, offer, coins("3"), Cell::empty()).unwrap();
    assert_eq!(top_up.failures().count(), 0);
    let excesses = op_body(op::EXCESSES, 7).unwrap();
    let ack = chain.send(stranger, offer, coins("0.5"), excesses).unwrap();
    assert_eq!(ack.failures().count(), 0);
    assert_eq!(chain.offer(&offer).unwrap().balance(), coins("5.1"));

    // carried to the first party on cancel
    let result = chain
        .send(parties.first, offer, Coins::ZERO, cancel_offer_body().unwrap())
        .unwrap();
    assert!(result.has_transaction(&TxFilter {
        from: Some(offer),
        to: Some(parties.first),
        value: Some(coins("5.05")),
        ..Default::default()
    }));
}

// ═══════════════════════════════════════════════════════════════════
// Seeded Traffic
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_default_traffic_passes() {
    init_tracing();
    let result = run_offer_traffic(2024, &TrafficConfig::default()).unwrap();
    assert!(result.passed, "{}", result.details);
    assert_eq!(result.offers_run, 50);
    assert!(result.completed > 0);
    assert!(result.canceled > 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_traffic_conserves_value(seed in any::<u64>()) {
        let config = TrafficConfig {
            offers: 4,
            max_items: 10,
            max_value_units: 500,
        };
        let result = run_offer_traffic(seed, &config).unwrap();
        prop_assert!(result.passed, "{}", result.details);
    }
}
