//! Seeded offer traffic scenario
//!
//! Drives many offers through random but reproducible lifecycles and checks
//! the chain-wide invariants after each one: total value is conserved, the
//! settled offer holds no balance, and no item is left in its custody.

use contracts::message::{cancel_offer_body, confirm_offer_body};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::address::Address;
use types::coins::{Coins, NANO_PER_UNIT};
use types::errors::OfferError;
use types::offer::OfferStatus;

use crate::chain::{Blockchain, SimError};
use crate::fixtures::{accept_stage, deploy_offer, init_items, Parties};

/// Traffic shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficConfig {
    pub offers: usize,
    /// Upper bound on items per side.
    pub max_items: usize,
    /// Upper bound on declared value per side, in whole units.
    pub max_value_units: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            offers: 50,
            max_items: 10,
            max_value_units: 1_000,
        }
    }
}

/// Result of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub seed: u64,
    pub offers_run: usize,
    pub completed: usize,
    pub canceled: usize,
    /// Unauthorized or early operations that were correctly rejected.
    pub rejected_attempts: usize,
    pub transactions: usize,
    pub passed: bool,
    pub details: String,
}

impl ScenarioResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy)]
enum Ending {
    Confirm,
    CancelByFirst,
    CancelBySecond,
    CancelByAdmin,
}

/// Run `config.offers` random offer lifecycles with a seeded RNG.
pub fn run_offer_traffic(seed: u64, config: &TrafficConfig) -> Result<ScenarioResult, SimError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut chain = Blockchain::new();
    let admin = chain.treasury("admin");
    let fee_recipient_1 = chain.treasury("serviceWallet1");
    let fee_recipient_2 = chain.treasury("serviceWallet2");
    let stranger = chain.treasury("stranger");
    let delay = chain.config().admin_cancel_delay_secs;

    let mut result = ScenarioResult {
        name: "offer_traffic".to_string(),
        seed,
        offers_run: 0,
        completed: 0,
        canceled: 0,
        rejected_attempts: 0,
        transactions: 0,
        passed: true,
        details: String::new(),
    };

    for i in 0..config.offers {
        let parties = Parties {
            first: chain.treasury(&format!("first-{}", i % 4)),
            second: chain.treasury(&format!("second-{}", i % 3)),
            admin,
            fee_recipient_1,
            fee_recipient_2,
        };
        // items are minted before the baseline so it covers every wallet
        let n1 = rng.gen_range(1..=config.max_items.max(1));
        let n2 = rng.gen_range(0..=config.max_items);
        let first_items = init_items(&mut chain, parties.first, &format!("offer-{}-first", i), n1)?;
        let second_items = init_items(&mut chain, parties.second, &format!("offer-{}-second", i), n2)?;
        let first_value = random_value(&mut rng, config.max_value_units);
        let second_value = random_value(&mut rng, config.max_value_units);
        let baseline = chain
            .total_value()
            .ok_or(SimError::Offer(OfferError::Overflow))?;

        let offer = deploy_offer(&mut chain, &parties, first_value, &first_items)?;

        let accept = rng.gen_bool(0.75);
        let ending = if accept {
            accept_stage(&mut chain, offer, parties.second, second_value, &second_items)?;
            match rng.gen_range(0..4) {
                0 => Ending::CancelByFirst,
                1 => Ending::CancelBySecond,
                2 => Ending::CancelByAdmin,
                _ => Ending::Confirm,
            }
        } else {
            Ending::CancelByFirst
        };

        // a stranger always fails
        let attempt = chain.send(stranger, offer, Coins::from_units(1), cancel_offer_body()?)?;
        if attempt.failures().count() == 1 {
            result.rejected_attempts += 1;
        }

        let (sender, body) = match ending {
            Ending::Confirm => (parties.first, confirm_offer_body()?),
            Ending::CancelByFirst => (parties.first, cancel_offer_body()?),
            Ending::CancelBySecond => (parties.second, cancel_offer_body()?),
            Ending::CancelByAdmin => {
                let early = chain.send(admin, offer, Coins::ZERO, cancel_offer_body()?)?;
                if early.failures().count() == 1 {
                    result.rejected_attempts += 1;
                }
                chain.advance(delay);
                (admin, cancel_offer_body()?)
            }
        };
        chain.send(sender, offer, Coins::ZERO, body)?;
        chain.advance(rng.gen_range(1..600));

        let status = chain
            .offer(&offer)
            .map(|o| o.get_status())
            .ok_or(SimError::UnknownOffer(offer))?;
        match status {
            OfferStatus::OfferCompleted => result.completed += 1,
            OfferStatus::OfferCanceled => result.canceled += 1,
            other => fail(&mut result, i, &format!("status {} after {:?}", other, ending)),
        }
        check_settled(&chain, &offer, baseline, i, &mut result);
        result.offers_run += 1;
    }

    result.transactions = chain.transactions().len();
    info!(
        seed,
        offers = result.offers_run,
        completed = result.completed,
        canceled = result.canceled,
        passed = result.passed,
        "Offer traffic finished"
    );
    Ok(result)
}

fn random_value(rng: &mut ChaCha8Rng, max_units: u64) -> Coins {
    let max_nano = max_units as u128 * NANO_PER_UNIT;
    Coins::from_nano(rng.gen_range(0..=max_nano))
}

fn check_settled(
    chain: &Blockchain,
    offer: &Address,
    baseline: Coins,
    i: usize,
    result: &mut ScenarioResult,
) {
    let balance = chain.offer(offer).map(|o| o.balance()).unwrap_or_default();
    if !balance.is_zero() {
        fail(result, i, &format!("offer balance {} after settlement", balance));
    }
    let held = chain.items_owned_by(offer);
    if held != 0 {
        fail(result, i, &format!("{} items left in custody", held));
    }
    match chain.total_value() {
        Some(total) if total == baseline => {}
        total => fail(result, i, &format!("total value {:?} != {}", total, baseline)),
    }
}

fn fail(result: &mut ScenarioResult, i: usize, reason: &str) {
    result.passed = false;
    if !result.details.is_empty() {
        result.details.push_str("; ");
    }
    result.details.push_str(&format!("offer {}: {}", i, reason));
}
