//! JSON scenarios replayed against a fresh sandbox.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use bundler_common::{Address, Amount, Field, Nullifier};
use bundler_contract::{ExecuteMsg, InstantiateMsg, Response, TokenBundler};
use bundler_sandbox::{Sandbox, SandboxConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Ok,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `authorizer` grants `caller` a witness for exactly `msg`.
    Grant {
        authorizer: Address,
        caller: Address,
        msg: ExecuteMsg,
    },
    Call {
        caller: Address,
        msg: ExecuteMsg,
        #[serde(default)]
        expect: Option<Expectation>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub sandbox: SandboxConfig,
    pub admin: Address,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Granted { inner_hash: Field },
    NotDelegatable,
    Committed { response: Response },
    Reverted { error: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub entry_point: &'static str,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub expectation_met: bool,
}

/// Balances after the last step, keyed by asset symbol then book.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BalanceSheet {
    pub public: BTreeMap<String, BTreeMap<Address, Amount>>,
    pub private: BTreeMap<String, BTreeMap<Address, Amount>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepReport>,
    pub balances: BalanceSheet,
    /// Witnesses granted over the run, consumed or not.
    pub grants: usize,
    pub nullifiers: Vec<Nullifier>,
}

impl ScenarioReport {
    pub fn all_expectations_met(&self) -> bool {
        self.steps.iter().all(|s| s.expectation_met)
    }
}

pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport> {
    let mut sandbox =
        Sandbox::from_config(&scenario.sandbox).context("failed to build sandbox")?;
    let contract = TokenBundler::instantiate(InstantiateMsg {
        admin: scenario.admin,
    })
    .context("failed to instantiate contract")?;

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let report = match step {
            Step::Grant {
                authorizer,
                caller,
                msg,
            } => {
                let outcome = match sandbox.grant_for_message(*authorizer, *caller, msg) {
                    Some(inner_hash) => StepOutcome::Granted { inner_hash },
                    None => StepOutcome::NotDelegatable,
                };
                let expectation_met = !matches!(outcome, StepOutcome::NotDelegatable);
                StepReport {
                    index,
                    entry_point: msg.entry_point(),
                    outcome,
                    expectation_met,
                }
            }
            Step::Call {
                caller,
                msg,
                expect,
            } => {
                let result = sandbox.execute(&contract, *caller, msg);
                let expectation_met = match (expect, &result) {
                    (None, _) => true,
                    (Some(Expectation::Ok), Ok(_)) => true,
                    (Some(Expectation::Error), Err(_)) => true,
                    _ => false,
                };
                let outcome = match result {
                    Ok(response) => StepOutcome::Committed { response },
                    Err(err) => StepOutcome::Reverted {
                        error: err.to_string(),
                    },
                };
                StepReport {
                    index,
                    entry_point: msg.entry_point(),
                    outcome,
                    expectation_met,
                }
            }
        };

        if report.expectation_met {
            info!(step = index, entry_point = report.entry_point, "step done");
        } else {
            warn!(step = index, entry_point = report.entry_point, "step did not meet expectation");
        }
        steps.push(report);
    }

    Ok(ScenarioReport {
        steps,
        balances: balance_sheet(&sandbox),
        grants: sandbox.authwits().len(),
        nullifiers: sandbox.nullifiers().iter().copied().collect(),
    })
}

fn balance_sheet(sandbox: &Sandbox) -> BalanceSheet {
    let mut sheet = BalanceSheet::default();
    for (asset, books) in sandbox.ledger().assets() {
        let label = if books.symbol.is_empty() {
            asset.to_string()
        } else {
            books.symbol.clone()
        };
        sheet.public.insert(label.clone(), books.public.clone());
        sheet.private.insert(label, books.private.clone());
    }
    sheet
}
