//! End-to-end behaviour of the bundler contract against the sandbox host.

use bundler_common::{compute_authwit_nullifier, compute_inner_hash};
use bundler_contract::{
    Address, Amount, AuthwitError, ContractError, ExchangeTokens, ExecuteMsg, Field,
    InstantiateMsg, QueryMsg, SendTokens, TokenBundler, TransferRequest, Visibility,
};
use bundler_sandbox::{AssetConfig, GenesisBalance, Sandbox, SandboxConfig};
use proptest::prelude::*;

const CONTRACT: u64 = 0xb0;
const ADMIN: u64 = 0xad;
const STABLE: u64 = 0x51;
const REWARD: u64 = 0x52;
const ALICE: u64 = 0xa;
const BOB: u64 = 0xb;
const CAROL: u64 = 0xc;

const FUNDING: Amount = 1_000;

fn addr(value: u64) -> Address {
    Address::from_low_u64(value)
}

/// Every party holds `FUNDING` of both assets in both books.
fn setup() -> (Sandbox, TokenBundler) {
    let mut balances = vec![];
    for owner in [ALICE, BOB, CAROL] {
        for asset in [STABLE, REWARD] {
            balances.push(GenesisBalance {
                asset: addr(asset),
                owner: addr(owner),
                public: FUNDING,
                private: FUNDING,
            });
        }
    }
    let config = SandboxConfig {
        contract_address: addr(CONTRACT),
        assets: vec![
            AssetConfig { address: addr(STABLE), symbol: "USD".into() },
            AssetConfig { address: addr(REWARD), symbol: "RWD".into() },
        ],
        balances,
    };

    let sandbox = Sandbox::from_config(&config).expect("valid sandbox config");
    let contract = TokenBundler::instantiate(InstantiateMsg { admin: addr(ADMIN) })
        .expect("non-zero admin");
    (sandbox, contract)
}

fn send(to: u64, stable_amount: Amount, reward_amount: Amount) -> SendTokens {
    SendTokens {
        to: addr(to),
        reward_token: addr(REWARD),
        stable_token: addr(STABLE),
        stable_amount,
        reward_amount,
    }
}

fn exchange(from: u64, stable_amount: Amount, reward_amount: Amount, nonce: u64) -> ExchangeTokens {
    ExchangeTokens {
        from: addr(from),
        stable_token: addr(STABLE),
        reward_token: addr(REWARD),
        stable_amount,
        reward_amount,
        nonce: Field::from(nonce),
    }
}

fn exchange_msg(visibility: Visibility, args: ExchangeTokens) -> ExecuteMsg {
    match visibility {
        Visibility::Public => ExecuteMsg::ExchangeTokensPublic(args),
        Visibility::Private => ExecuteMsg::ExchangeTokensPrivate(args),
    }
}

fn send_msg(visibility: Visibility, args: SendTokens) -> ExecuteMsg {
    match visibility {
        Visibility::Public => ExecuteMsg::SendTokensPublic(args),
        Visibility::Private => ExecuteMsg::SendTokensPrivate(args),
    }
}

fn balance(sandbox: &Sandbox, visibility: Visibility, asset: u64, owner: u64) -> Amount {
    sandbox.balance(visibility, &addr(asset), &addr(owner))
}

#[test]
fn scenario_a_send_public_stable_only() {
    let (mut sandbox, contract) = setup();

    let res = sandbox
        .execute(&contract, addr(ALICE), &send_msg(Visibility::Public, send(BOB, 100, 0)))
        .unwrap();

    let expected = TransferRequest {
        visibility: Visibility::Public,
        asset: addr(STABLE),
        from: addr(ALICE),
        to: addr(BOB),
        amount: 100,
        nonce: Field::ZERO,
    };
    assert_eq!(sandbox.last_transfers(), vec![&expected]);
    assert_eq!(res.transfers, vec![expected]);
    assert_eq!(res.attribute("action"), Some("send_tokens_public"));
    assert_eq!(res.attribute("authorization"), Some("self"));
    assert_eq!(balance(&sandbox, Visibility::Public, STABLE, BOB), FUNDING + 100);
    assert_eq!(balance(&sandbox, Visibility::Public, REWARD, BOB), FUNDING);
}

#[test]
fn send_private_moves_both_assets_in_private_books() {
    let (mut sandbox, contract) = setup();

    sandbox
        .execute(&contract, addr(ALICE), &send_msg(Visibility::Private, send(BOB, 30, 20)))
        .unwrap();

    assert_eq!(balance(&sandbox, Visibility::Private, STABLE, BOB), FUNDING + 30);
    assert_eq!(balance(&sandbox, Visibility::Private, REWARD, BOB), FUNDING + 20);
    assert_eq!(balance(&sandbox, Visibility::Public, STABLE, BOB), FUNDING);
    let assets: Vec<_> = sandbox.last_transfers().iter().map(|t| t.asset).collect();
    assert_eq!(assets, vec![addr(STABLE), addr(REWARD)]);
}

#[test]
fn scenario_b_delegated_private_exchange() {
    let (mut sandbox, contract) = setup();
    let msg = exchange_msg(Visibility::Private, exchange(ALICE, 50, 10, 42));
    sandbox.grant_for_message(addr(ALICE), addr(CAROL), &msg).unwrap();

    sandbox.execute(&contract, addr(CAROL), &msg).unwrap();

    let transfers = sandbox.last_transfers();
    assert_eq!(
        transfers,
        vec![
            &TransferRequest {
                visibility: Visibility::Private,
                asset: addr(STABLE),
                from: addr(ALICE),
                to: addr(CAROL),
                amount: 50,
                nonce: Field::from(42u64),
            },
            &TransferRequest {
                visibility: Visibility::Private,
                asset: addr(REWARD),
                from: addr(CAROL),
                to: addr(ALICE),
                amount: 10,
                nonce: Field::ZERO,
            },
        ]
    );
    assert_eq!(balance(&sandbox, Visibility::Private, STABLE, CAROL), FUNDING + 50);
    assert_eq!(balance(&sandbox, Visibility::Private, REWARD, ALICE), FUNDING + 10);
}

#[test]
fn scenario_c_self_exchange_nonce_rules() {
    let (mut sandbox, contract) = setup();

    let ok = exchange_msg(Visibility::Public, exchange(CAROL, 10, 10, 0));
    let res = sandbox.execute(&contract, addr(CAROL), &ok).unwrap();
    assert_eq!(res.attribute("authorization"), Some("self"));
    assert_eq!(sandbox.last_transfers().len(), 2);
    assert!(sandbox.nullifiers().is_empty());

    let bad = exchange_msg(Visibility::Public, exchange(CAROL, 10, 10, 7));
    let err = sandbox.execute(&contract, addr(CAROL), &bad).unwrap_err();
    assert_eq!(err, ContractError::InvalidNonce { nonce: Field::from(7u64) });
    assert!(sandbox.last_trace().is_empty());
}

#[test]
fn scenario_d_admin_initialization() {
    let err = TokenBundler::instantiate(InstantiateMsg { admin: Address::ZERO }).unwrap_err();
    assert_eq!(err, ContractError::InvalidAdmin);

    let mut contract = TokenBundler::instantiate(InstantiateMsg { admin: addr(ADMIN) }).unwrap();
    let err = contract.initialize(addr(0xee)).unwrap_err();
    assert_eq!(err, ContractError::AlreadyInitialized { admin: addr(ADMIN) });
    assert_eq!(contract.query(&QueryMsg::Admin {}).admin, Some(addr(ADMIN)));
}

#[test]
fn uninitialized_contract_rejects_calls() {
    let (mut sandbox, _) = setup();
    let contract = TokenBundler::new();

    let err = sandbox
        .execute(&contract, addr(ALICE), &send_msg(Visibility::Public, send(BOB, 1, 1)))
        .unwrap_err();
    assert_eq!(err, ContractError::NotInitialized);
    assert!(sandbox.last_trace().is_empty());
}

#[test]
fn p2_missing_witness_blocks_every_leg() {
    for visibility in [Visibility::Public, Visibility::Private] {
        let (mut sandbox, contract) = setup();
        let msg = exchange_msg(visibility, exchange(ALICE, 50, 10, 3));

        let err = sandbox.execute(&contract, addr(CAROL), &msg).unwrap_err();

        assert!(matches!(
            err,
            ContractError::Authorization { source: AuthwitError::Missing { .. }, .. }
        ));
        assert!(sandbox.last_transfers().is_empty());
        assert_eq!(balance(&sandbox, visibility, STABLE, ALICE), FUNDING);
    }
}

#[test]
fn witness_granted_to_another_caller_is_rejected() {
    let (mut sandbox, contract) = setup();
    let msg = exchange_msg(Visibility::Public, exchange(ALICE, 50, 0, 3));
    sandbox.grant_for_message(addr(ALICE), addr(BOB), &msg).unwrap();

    let err = sandbox.execute(&contract, addr(CAROL), &msg).unwrap_err();
    assert!(matches!(err, ContractError::Authorization { .. }));
}

#[test]
fn witness_is_bound_to_exact_arguments() {
    let (mut sandbox, contract) = setup();
    let granted = exchange_msg(Visibility::Public, exchange(ALICE, 50, 0, 3));
    sandbox.grant_for_message(addr(ALICE), addr(CAROL), &granted).unwrap();

    let inflated = exchange_msg(Visibility::Public, exchange(ALICE, 500, 0, 3));
    assert!(sandbox.execute(&contract, addr(CAROL), &inflated).is_err());

    sandbox.execute(&contract, addr(CAROL), &granted).unwrap();
}

#[test]
fn replaying_a_consumed_witness_fails() {
    let (mut sandbox, contract) = setup();
    let msg = exchange_msg(Visibility::Public, exchange(ALICE, 5, 1, 11));
    sandbox.grant_for_message(addr(ALICE), addr(CAROL), &msg).unwrap();

    sandbox.execute(&contract, addr(CAROL), &msg).unwrap();
    let err = sandbox.execute(&contract, addr(CAROL), &msg).unwrap_err();

    assert!(matches!(
        err,
        ContractError::Authorization { source: AuthwitError::Nullified { .. }, .. }
    ));
    assert_eq!(balance(&sandbox, Visibility::Public, STABLE, CAROL), FUNDING + 5);
}

#[test]
fn p4_cancelled_witness_can_never_validate() {
    for (visibility, cancel_stable) in [(Visibility::Public, true), (Visibility::Private, false)] {
        let (mut sandbox, contract) = setup();
        let msg = exchange_msg(visibility, exchange(ALICE, 50, 10, 8));
        let inner_hash = sandbox.grant_for_message(addr(ALICE), addr(CAROL), &msg).unwrap();

        let cancel = if cancel_stable {
            ExecuteMsg::CancelStableAuthwit { inner_hash }
        } else {
            ExecuteMsg::CancelRewardAuthwit { inner_hash }
        };
        let res = sandbox.execute(&contract, addr(ALICE), &cancel).unwrap();
        let expected = compute_authwit_nullifier(&addr(ALICE), &inner_hash);
        assert_eq!(res.attribute("nullifier"), Some(expected.to_string().as_str()));

        let err = sandbox.execute(&contract, addr(CAROL), &msg).unwrap_err();
        assert!(matches!(
            err,
            ContractError::Authorization { source: AuthwitError::Nullified { .. }, .. }
        ));
        assert!(sandbox.last_transfers().is_empty());
    }
}

// Revocation burns (caller, inner_hash): someone else cancelling creates an
// unrelated nullifier and the witness stays usable.
#[test]
fn cancel_by_non_authorizer_does_not_revoke() {
    let (mut sandbox, contract) = setup();
    let msg = exchange_msg(Visibility::Public, exchange(ALICE, 50, 0, 8));
    let inner_hash = sandbox.grant_for_message(addr(ALICE), addr(CAROL), &msg).unwrap();

    sandbox
        .execute(&contract, addr(BOB), &ExecuteMsg::CancelStableAuthwit { inner_hash })
        .unwrap();

    sandbox.execute(&contract, addr(CAROL), &msg).unwrap();
}

#[test]
fn cancelling_a_consumed_witness_fails() {
    let (mut sandbox, contract) = setup();
    let msg = exchange_msg(Visibility::Public, exchange(ALICE, 50, 0, 8));
    let inner_hash = sandbox.grant_for_message(addr(ALICE), addr(CAROL), &msg).unwrap();
    sandbox.execute(&contract, addr(CAROL), &msg).unwrap();

    let err = sandbox
        .execute(&contract, addr(ALICE), &ExecuteMsg::CancelRewardAuthwit { inner_hash })
        .unwrap_err();
    assert!(matches!(err, ContractError::Nullifier(_)));
}

#[test]
fn p5_exchange_direction() {
    for visibility in [Visibility::Public, Visibility::Private] {
        let (mut sandbox, contract) = setup();
        let msg = exchange_msg(visibility, exchange(ALICE, 70, 30, 1));
        sandbox.grant_for_message(addr(ALICE), addr(CAROL), &msg).unwrap();

        sandbox.execute(&contract, addr(CAROL), &msg).unwrap();

        assert_eq!(balance(&sandbox, visibility, STABLE, ALICE), FUNDING - 70);
        assert_eq!(balance(&sandbox, visibility, STABLE, CAROL), FUNDING + 70);
        assert_eq!(balance(&sandbox, visibility, REWARD, CAROL), FUNDING - 30);
        assert_eq!(balance(&sandbox, visibility, REWARD, ALICE), FUNDING + 30);
    }
}

// The private exchange skips the witness when nothing is pulled; the public
// one does not. Kept asymmetric on purpose.
#[test]
fn zero_pull_witness_asymmetry() {
    let (mut sandbox, contract) = setup();

    let public = exchange_msg(Visibility::Public, exchange(ALICE, 0, 10, 0));
    let err = sandbox.execute(&contract, addr(CAROL), &public).unwrap_err();
    assert!(matches!(err, ContractError::Authorization { .. }));

    let private = exchange_msg(Visibility::Private, exchange(ALICE, 0, 10, 0));
    let res = sandbox.execute(&contract, addr(CAROL), &private).unwrap();
    assert_eq!(res.attribute("authorization"), Some("not_required"));
    assert_eq!(balance(&sandbox, Visibility::Private, REWARD, ALICE), FUNDING + 10);
}

// Nothing moves, but nonce and witness rules still apply.
#[test]
fn both_zero_amounts_still_authorize() {
    let (mut sandbox, contract) = setup();

    let res = sandbox
        .execute(&contract, addr(ALICE), &send_msg(Visibility::Public, send(BOB, 0, 0)))
        .unwrap();
    assert_eq!(res.attribute("transfers"), Some("0"));
    assert!(res.transfers.is_empty());
    assert!(sandbox.last_trace().is_empty());

    let self_exchange = exchange_msg(Visibility::Private, exchange(ALICE, 0, 0, 5));
    let err = sandbox.execute(&contract, addr(ALICE), &self_exchange).unwrap_err();
    assert_eq!(err, ContractError::InvalidNonce { nonce: Field::from(5u64) });
    assert!(sandbox.last_transfers().is_empty());

    let public = exchange_msg(Visibility::Public, exchange(ALICE, 0, 0, 0));
    let err = sandbox.execute(&contract, addr(CAROL), &public).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Authorization { source: AuthwitError::Missing { .. }, .. }
    ));
    assert!(sandbox.last_transfers().is_empty());

    let private = exchange_msg(Visibility::Private, exchange(ALICE, 0, 0, 0));
    let res = sandbox.execute(&contract, addr(CAROL), &private).unwrap();
    assert_eq!(res.attribute("authorization"), Some("not_required"));
    assert!(sandbox.last_trace().is_empty());
    assert!(sandbox.nullifiers().is_empty());

    for owner in [ALICE, BOB, CAROL] {
        for asset in [STABLE, REWARD] {
            assert_eq!(balance(&sandbox, Visibility::Public, asset, owner), FUNDING);
            assert_eq!(balance(&sandbox, Visibility::Private, asset, owner), FUNDING);
        }
    }
}

#[test]
fn witness_from_other_deployment_is_rejected() {
    let (mut sandbox, contract) = setup();
    let args = exchange(ALICE, 50, 0, 2);
    let foreign = compute_inner_hash(
        &addr(0xdead),
        &addr(CAROL),
        &args.action(Visibility::Public),
    );
    sandbox.grant_authwit(Visibility::Public, addr(ALICE), foreign);

    let err = sandbox
        .execute(&contract, addr(CAROL), &ExecuteMsg::ExchangeTokensPublic(args))
        .unwrap_err();
    assert!(matches!(err, ContractError::Authorization { .. }));
}

fn visibility_strategy() -> impl Strategy<Value = Visibility> {
    prop_oneof![Just(Visibility::Public), Just(Visibility::Private)]
}

proptest! {
    #[test]
    fn p1_nonzero_nonce_on_self_call_fails(
        visibility in visibility_strategy(),
        nonce in 1u64..,
        stable in 0u128..=FUNDING,
        reward in 0u128..=FUNDING,
    ) {
        let (mut sandbox, contract) = setup();
        let msg = exchange_msg(visibility, exchange(ALICE, stable, reward, nonce));

        let err = sandbox.execute(&contract, addr(ALICE), &msg).unwrap_err();

        prop_assert_eq!(err, ContractError::InvalidNonce { nonce: Field::from(nonce) });
        prop_assert!(sandbox.last_transfers().is_empty());
    }

    #[test]
    fn p3_single_nonzero_leg_issues_single_call(
        visibility in visibility_strategy(),
        amount in 1u128..=FUNDING,
        stable_side in any::<bool>(),
        use_exchange in any::<bool>(),
    ) {
        let (mut sandbox, contract) = setup();
        let (stable, reward) = if stable_side { (amount, 0) } else { (0, amount) };
        let msg = if use_exchange {
            exchange_msg(visibility, exchange(ALICE, stable, reward, 0))
        } else {
            send_msg(visibility, send(BOB, stable, reward))
        };

        sandbox.execute(&contract, addr(ALICE), &msg).unwrap();

        let transfers = sandbox.last_transfers();
        prop_assert_eq!(transfers.len(), 1);
        let call = transfers[0];
        prop_assert_eq!(call.amount, amount);
        prop_assert_eq!(call.visibility, visibility);
        prop_assert_eq!(call.asset, if stable_side { addr(STABLE) } else { addr(REWARD) });
        prop_assert_eq!(call.nonce, Field::ZERO);
    }
}
