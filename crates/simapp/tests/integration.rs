//! End-to-end tests for the lockup engine wired into the simulation app

use chrono::{DateTime, TimeZone, Utc};
use lockup_core::{
    Address, Amount, Coin, Denom, Extension, LockupMsg, MsgExtend, MsgLock, MsgMultiSendDelegateAndLock,
    MsgSendDelegateAndLock, MultiSendDelegateAndLockOutput, UnlockDate, ValidatorAddress,
};
use lockup_hooks::{Tx, TxMsg};
use lockup_keeper::{ErrorKind, LockupConfig, LockupResult, PageRequest};
use lockup_ledger::{get_expiration_amount, get_locks, Lock};
use lockup_risk::{AccountKeeper, AccountKind};
use lockup_simapp::{module_address, AppError, SimApp};
use lockup_store::Event;
use rust_decimal_macros::dec;

// === Fixtures ===

fn utsc() -> Denom {
    "utsc".parse().unwrap()
}

fn coin(amount: u64) -> Coin {
    Coin::new(amount, utsc())
}

fn alice() -> Address {
    Address::from_bytes([0xa1; 20])
}

fn bob() -> Address {
    Address::from_bytes([0xb0; 20])
}

fn carol() -> Address {
    Address::from_bytes([0xc0; 20])
}

fn dave() -> Address {
    Address::from_bytes([0xd0; 20])
}

fn validator() -> ValidatorAddress {
    ValidatorAddress::from_bytes([0x7a; 20])
}

fn date(s: &str) -> UnlockDate {
    s.parse().unwrap()
}

/// 2026-01-15, mid-morning
fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// App at height 1 on `genesis`: one validator, alice holds 2000 and bob 1000
fn setup_at(genesis: DateTime<Utc>) -> SimApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut app = SimApp::new(LockupConfig::default(), utsc(), genesis).unwrap();
    app.create_validator(validator()).unwrap();
    app.fund_account(&alice(), &[coin(2000)]).unwrap();
    app.fund_account(&bob(), &[coin(1000)]).unwrap();
    app.begin_block(genesis);
    app
}

fn setup() -> SimApp {
    setup_at(today())
}

fn delegate(delegator: Address, amount: u64) -> TxMsg {
    TxMsg::Delegate {
        delegator,
        validator: validator(),
        amount: coin(amount),
    }
}

fn undelegate(delegator: Address, amount: u64) -> TxMsg {
    TxMsg::Undelegate {
        delegator,
        validator: validator(),
        amount: coin(amount),
    }
}

fn send(from: Address, to: Address, amount: u64) -> TxMsg {
    TxMsg::Send {
        from,
        to,
        amount: vec![coin(amount)],
    }
}

fn lock(address: Address, unlock_date: &str, amount: u64) -> TxMsg {
    TxMsg::Lockup(LockupMsg::Lock(MsgLock::new(
        address.to_string(),
        unlock_date,
        coin(amount),
    )))
}

fn extend(address: Address, extensions: Vec<Extension>) -> TxMsg {
    TxMsg::Lockup(LockupMsg::Extend(MsgExtend::new(address.to_string(), extensions)))
}

fn send_delegate_and_lock(
    from: Address,
    to: Address,
    operator: ValidatorAddress,
    unlock_date: &str,
    amount: u64,
) -> MsgSendDelegateAndLock {
    MsgSendDelegateAndLock {
        from_address: from.to_string(),
        to_address: to.to_string(),
        validator_address: operator.to_string(),
        unlock_date: unlock_date.to_string(),
        amount: coin(amount),
    }
}

fn output(to: Address, unlock_date: &str, amount: u64) -> MultiSendDelegateAndLockOutput {
    MultiSendDelegateAndLockOutput {
        to_address: to.to_string(),
        validator_address: validator().to_string(),
        unlock_date: unlock_date.to_string(),
        amount: coin(amount),
    }
}

fn deliver(app: &mut SimApp, msgs: Vec<TxMsg>) -> Result<Vec<Event>, AppError> {
    app.deliver_tx(&Tx::new(msgs))
}

fn amount(app: &mut SimApp, f: impl Fn(&mut SimApp) -> LockupResult<Amount>) -> u64 {
    let value = f(app).unwrap();
    value.to_string().parse().unwrap()
}

fn balance(app: &mut SimApp, address: &Address) -> u64 {
    amount(app, |app| app.balance(address))
}

fn locked(app: &mut SimApp, address: &Address) -> u64 {
    amount(app, |app| app.total_locked(address))
}

fn delegated(app: &mut SimApp, address: &Address) -> u64 {
    amount(app, |app| app.total_delegated(address))
}

/// Every address with active locks is fully backed and both indexes agree
fn assert_invariant(app: &mut SimApp, addresses: &[Address]) {
    for address in addresses {
        let locked = locked(app, address);
        if locked > 0 {
            assert!(
                delegated(app, address) >= locked,
                "{address} has {locked} locked but only {} delegated",
                delegated(app, address)
            );
        }
    }
    assert!(app.audit().unwrap().is_consistent());
}

/// Alice delegates 1000 and locks all of it until 2027-01-15
fn alice_locked_1000(app: &mut SimApp) {
    deliver(app, vec![delegate(alice(), 1000)]).unwrap();
    deliver(app, vec![lock(alice(), "2027-01-15", 1000)]).unwrap();
}

// === Lock ===

#[test]
fn test_lock_backed_by_delegation_leaves_balance_spendable() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    assert_eq!(balance(&mut app, &alice()), 1000);

    let events = deliver(&mut app, vec![lock(alice(), "2027-01-15", 1000)]).unwrap();
    let lock_event = events.iter().find(|e| e.kind == "lock").unwrap();
    assert_eq!(lock_event.get("address"), Some(alice().to_string().as_str()));
    assert_eq!(lock_event.get("unlock_date"), Some("2027-01-15"));
    assert_eq!(lock_event.get("amount"), Some("1000"));
    assert_eq!(locked(&mut app, &alice()), 1000);

    // Exposure is zero, so the liquid balance moves freely
    deliver(&mut app, vec![send(alice(), bob(), 1)]).unwrap();
    assert_eq!(balance(&mut app, &alice()), 999);
    assert_eq!(balance(&mut app, &bob()), 1001);
    assert_invariant(&mut app, &[alice(), bob()]);
}

#[test]
fn test_lock_requires_delegation() {
    let mut app = setup();
    let err = deliver(&mut app, vec![lock(alice(), "2027-01-15", 1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);

    deliver(&mut app, vec![delegate(alice(), 500)]).unwrap();
    deliver(&mut app, vec![lock(alice(), "2027-01-15", 300)]).unwrap();
    let err = deliver(&mut app, vec![lock(alice(), "2027-06-01", 201)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);
    deliver(&mut app, vec![lock(alice(), "2027-06-01", 200)]).unwrap();
    assert_eq!(locked(&mut app, &alice()), 500);
}

#[test]
fn test_lock_date_window_boundaries() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();

    let err = deliver(&mut app, vec![lock(alice(), "2026-07-14", 100)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    deliver(&mut app, vec![lock(alice(), "2026-07-15", 100)]).unwrap();

    deliver(&mut app, vec![lock(alice(), "2028-01-15", 100)]).unwrap();
    let err = deliver(&mut app, vec![lock(alice(), "2028-01-16", 100)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let err = deliver(&mut app, vec![lock(alice(), "2026-02-30", 100)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDate);

    assert_eq!(locked(&mut app, &alice()), 200);
}

#[test]
fn test_lock_rejects_wrong_denom_and_module_accounts() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();

    let other = Coin::new(10u64, "uatom".parse().unwrap());
    let msg = TxMsg::Lockup(LockupMsg::Lock(MsgLock::new(
        alice().to_string(),
        "2027-01-15",
        other,
    )));
    assert_eq!(
        deliver(&mut app, vec![msg]).unwrap_err().kind(),
        ErrorKind::InvalidAmount
    );

    let gov = module_address("gov");
    let err = deliver(&mut app, vec![lock(gov, "2027-01-15", 10)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAccount);
}

#[test]
fn test_lock_marks_account_lock_bearing() {
    let mut app = setup();
    alice_locked_1000(&mut app);

    let accounts = app.modules.accounts.clone();
    let account = app
        .query(|_, ctx| Ok(accounts.get_account(ctx, &alice())?))
        .unwrap()
        .unwrap();
    assert_eq!(account.kind, AccountKind::LockBearing);
}

#[test]
fn test_locks_on_same_day_merge() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    deliver(
        &mut app,
        vec![
            lock(alice(), "2027-01-15", 300),
            lock(alice(), "2027-01-15", 200),
        ],
    )
    .unwrap();

    let locks = get_locks(app.store(), &alice()).unwrap();
    assert_eq!(locks, vec![Lock::new(date("2027-01-15"), 500u64.into())]);
    assert_eq!(
        get_expiration_amount(app.store(), &date("2027-01-15"), &alice()).unwrap(),
        Amount::from(500u64)
    );
}

// === Guards ===

#[test]
fn test_undelegation_blocked_by_ante() {
    let mut app = setup();
    alice_locked_1000(&mut app);

    let err = deliver(&mut app, vec![undelegate(alice(), 500)]).unwrap_err();
    assert!(matches!(err, AppError::Ante(_)));
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);
    assert_eq!(delegated(&mut app, &alice()), 1000);
}

#[test]
fn test_undelegation_blocked_by_staking_hooks() {
    let mut app = setup();
    alice_locked_1000(&mut app);

    // Partial undelegation
    let err = app.execute_unguarded(&[undelegate(alice(), 500)]).unwrap_err();
    assert!(matches!(err, AppError::Message { index: 0, .. }));
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);

    // Full removal
    let err = app.execute_unguarded(&[undelegate(alice(), 1000)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);

    assert_eq!(delegated(&mut app, &alice()), 1000);
    assert_eq!(balance(&mut app, &alice()), 1000);
}

#[test]
fn test_surplus_delegation_can_leave() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1500)]).unwrap();
    deliver(&mut app, vec![lock(alice(), "2027-01-15", 1000)]).unwrap();

    deliver(&mut app, vec![undelegate(alice(), 500)]).unwrap();
    assert_eq!(delegated(&mut app, &alice()), 1000);

    let err = deliver(&mut app, vec![undelegate(alice(), 1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);
    assert_invariant(&mut app, &[alice()]);
}

#[test]
fn test_slash_exposure_limits_every_spend_path() {
    let mut app = setup();
    alice_locked_1000(&mut app);

    app.slash(&validator(), dec!(0.1)).unwrap();
    assert_eq!(delegated(&mut app, &alice()), 900);
    // Exposure 100, balance 1000: ceiling 900

    let err = deliver(&mut app, vec![send(alice(), bob(), 901)]).unwrap_err();
    assert!(matches!(err, AppError::Ante(_)));
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let err = app.evm_transfer(&alice(), &bob(), &[coin(901)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(balance(&mut app, &alice()), 1000);

    app.evm_transfer(&alice(), &bob(), &[coin(900)]).unwrap();
    assert_eq!(balance(&mut app, &alice()), 100);
    assert_eq!(balance(&mut app, &bob()), 1900);
}

#[test]
fn test_exec_wrapped_spend_is_guarded() {
    let mut app = setup();
    alice_locked_1000(&mut app);
    app.slash(&validator(), dec!(0.5)).unwrap();

    let exec = TxMsg::Exec {
        grantee: bob(),
        msgs: vec![send(alice(), bob(), 600)],
    };
    let err = deliver(&mut app, vec![exec]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let deposit = TxMsg::Deposit {
        depositor: alice(),
        proposal_id: 1,
        amount: vec![coin(600)],
    };
    let err = deliver(&mut app, vec![deposit]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(balance(&mut app, &alice()), 1000);
}

#[test]
fn test_failed_message_rolls_back_transaction() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();

    let err = deliver(
        &mut app,
        vec![
            send(alice(), bob(), 100),
            lock(alice(), "2027-01-15", 100),
            lock(alice(), "2030-01-01", 100),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Message { index: 2, .. }));

    assert_eq!(balance(&mut app, &alice()), 1000);
    assert_eq!(balance(&mut app, &bob()), 1000);
    assert_eq!(locked(&mut app, &alice()), 0);
    assert!(get_locks(app.store(), &alice()).unwrap().is_empty());
}

// === Extend ===

#[test]
fn test_extend_moves_bucket_and_index() {
    let genesis = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mut app = setup_at(genesis);
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    deliver(&mut app, vec![lock(alice(), "2026-01-01", 1000)]).unwrap();

    let events = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2026-01-01", "2027-01-01", coin(1000))],
        )],
    )
    .unwrap();

    let extended = events.iter().find(|e| e.kind == "lock_extended").unwrap();
    assert_eq!(extended.get("old_unlock_date"), Some("2026-01-01"));
    assert_eq!(extended.get("unlock_date"), Some("2027-01-01"));

    let locks = get_locks(app.store(), &alice()).unwrap();
    assert_eq!(locks, vec![Lock::new(date("2027-01-01"), 1000u64.into())]);
    assert!(get_expiration_amount(app.store(), &date("2026-01-01"), &alice())
        .unwrap()
        .is_zero());
    assert_eq!(
        get_expiration_amount(app.store(), &date("2027-01-01"), &alice()).unwrap(),
        Amount::from(1000u64)
    );
    assert_invariant(&mut app, &[alice()]);
}

#[test]
fn test_extend_chain_conserves_total() {
    let mut app = setup();
    alice_locked_1000(&mut app);

    deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![
                Extension::new("2027-01-15", "2027-06-01", coin(400)),
                Extension::new("2027-06-01", "2027-12-01", coin(100)),
            ],
        )],
    )
    .unwrap();

    let locks = get_locks(app.store(), &alice()).unwrap();
    assert_eq!(
        locks,
        vec![
            Lock::new(date("2027-01-15"), 600u64.into()),
            Lock::new(date("2027-06-01"), 300u64.into()),
            Lock::new(date("2027-12-01"), 100u64.into()),
        ]
    );
    assert_eq!(locked(&mut app, &alice()), 1000);
    assert_invariant(&mut app, &[alice()]);
}

#[test]
fn test_extend_failures() {
    let mut app = setup();

    // No lock-bearing account yet
    let err = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2027-01-15", "2027-06-01", coin(1))],
        )],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAccount);

    alice_locked_1000(&mut app);

    let err = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2027-02-01", "2027-06-01", coin(1))],
        )],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockupNotFound);

    let err = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2027-01-15", "2027-06-01", coin(1001))],
        )],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let err = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2027-01-15", "2028-01-16", coin(1))],
        )],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    // A failing second extension undoes the first
    let err = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![
                Extension::new("2027-01-15", "2027-06-01", coin(500)),
                Extension::new("2027-03-01", "2027-06-01", coin(1)),
            ],
        )],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockupNotFound);
    assert_eq!(
        get_locks(app.store(), &alice()).unwrap(),
        vec![Lock::new(date("2027-01-15"), 1000u64.into())]
    );
}

#[test]
fn test_extend_of_expired_bucket_needs_backing() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    deliver(&mut app, vec![lock(alice(), "2026-07-15", 1000)]).unwrap();

    // 2026-07-15: the bucket is spendable but not yet purged
    app.advance_days(181);
    assert_eq!(locked(&mut app, &alice()), 0);
    deliver(&mut app, vec![undelegate(alice(), 1000)]).unwrap();

    let err = deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2026-07-15", "2027-01-01", coin(1000))],
        )],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);

    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    deliver(
        &mut app,
        vec![extend(
            alice(),
            vec![Extension::new("2026-07-15", "2027-01-01", coin(1000))],
        )],
    )
    .unwrap();
    assert_eq!(locked(&mut app, &alice()), 1000);
}

// === Send, delegate and lock ===

#[test]
fn test_send_delegate_and_lock() {
    let mut app = setup();
    let msg = send_delegate_and_lock(bob(), carol(), validator(), "2027-01-15", 200);

    let events = deliver(
        &mut app,
        vec![TxMsg::Lockup(LockupMsg::SendDelegateAndLock(msg))],
    )
    .unwrap();
    let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
    assert!(kinds.contains(&"transfer"));
    assert!(kinds.contains(&"delegate"));
    assert!(kinds.contains(&"lock"));

    assert_eq!(balance(&mut app, &bob()), 800);
    assert_eq!(balance(&mut app, &carol()), 0);
    assert_eq!(delegated(&mut app, &carol()), 200);
    assert_eq!(locked(&mut app, &carol()), 200);
    assert_invariant(&mut app, &[bob(), carol()]);
}

#[test]
fn test_send_delegate_and_lock_rolls_back_on_bad_validator() {
    let mut app = setup();
    let missing = ValidatorAddress::from_bytes([0x99; 20]);
    let msg = send_delegate_and_lock(bob(), carol(), missing, "2027-01-15", 200);

    assert!(deliver(
        &mut app,
        vec![TxMsg::Lockup(LockupMsg::SendDelegateAndLock(msg))]
    )
    .is_err());
    assert_eq!(balance(&mut app, &bob()), 1000);
    assert_eq!(balance(&mut app, &carol()), 0);
    assert_eq!(locked(&mut app, &carol()), 0);
}

#[test]
fn test_multi_send_delegate_and_lock() {
    let mut app = setup();
    let mut msg = MsgMultiSendDelegateAndLock {
        from_address: bob().to_string(),
        total_amount: coin(300),
        outputs: vec![
            output(carol(), "2027-01-15", 100),
            output(dave(), "2027-06-01", 150),
        ],
    };

    let err = deliver(
        &mut app,
        vec![TxMsg::Lockup(LockupMsg::MultiSendDelegateAndLock(msg.clone()))],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    msg.total_amount = coin(250);
    deliver(
        &mut app,
        vec![TxMsg::Lockup(LockupMsg::MultiSendDelegateAndLock(msg))],
    )
    .unwrap();

    assert_eq!(balance(&mut app, &bob()), 750);
    assert_eq!(locked(&mut app, &carol()), 100);
    assert_eq!(locked(&mut app, &dave()), 150);
    assert_invariant(&mut app, &[bob(), carol(), dave()]);
}

#[test]
fn test_multi_send_delegate_and_lock_is_all_or_nothing() {
    let mut app = setup();
    let msg = MsgMultiSendDelegateAndLock {
        from_address: bob().to_string(),
        total_amount: coin(250),
        outputs: vec![
            output(carol(), "2027-01-15", 100),
            output(dave(), "2026-02-01", 150),
        ],
    };

    let err = deliver(
        &mut app,
        vec![TxMsg::Lockup(LockupMsg::MultiSendDelegateAndLock(msg))],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    assert_eq!(balance(&mut app, &bob()), 1000);
    assert_eq!(delegated(&mut app, &carol()), 0);
    assert_eq!(locked(&mut app, &carol()), 0);
    assert!(get_locks(app.store(), &carol()).unwrap().is_empty());
}

#[test]
fn test_multi_send_delegate_and_lock_rejects_foreign_total_denom() {
    let mut app = setup();
    let msg = MsgMultiSendDelegateAndLock {
        from_address: bob().to_string(),
        total_amount: Coin::new(250u64, "uatom".parse().unwrap()),
        outputs: vec![
            output(carol(), "2027-01-15", 100),
            output(dave(), "2027-01-15", 150),
        ],
    };

    let err = deliver(
        &mut app,
        vec![TxMsg::Lockup(LockupMsg::MultiSendDelegateAndLock(msg))],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAmount);

    assert_eq!(balance(&mut app, &bob()), 1000);
    assert_eq!(locked(&mut app, &carol()), 0);
    assert_eq!(locked(&mut app, &dave()), 0);
}

// === Contract gateway ===

#[test]
fn test_contract_calls_act_only_for_caller() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    let msg = LockupMsg::Lock(MsgLock::new(alice().to_string(), "2027-01-15", coin(400)));

    let err = app.contract_call(&bob(), &msg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(locked(&mut app, &alice()), 0);

    let events = app.contract_call(&alice(), &msg).unwrap();
    assert!(events.iter().any(|e| e.kind == "lock"));
    assert_eq!(locked(&mut app, &alice()), 400);

    let multi = LockupMsg::MultiSendDelegateAndLock(MsgMultiSendDelegateAndLock {
        from_address: alice().to_string(),
        total_amount: coin(1),
        outputs: vec![output(carol(), "2027-01-15", 1)],
    });
    let err = app.contract_call(&alice(), &multi).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[test]
fn test_contract_reads_locks_and_total() {
    let mut app = setup();
    alice_locked_1000(&mut app);

    let locks = app
        .contract_query(|gateway, ctx| gateway.locks(ctx, &alice()))
        .unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].unlock_date, date("2027-01-15"));
    assert_eq!(locks[0].amount, coin(1000));

    let none = app
        .contract_query(|gateway, ctx| gateway.locks(ctx, &bob()))
        .unwrap();
    assert!(none.is_empty());

    let total = app
        .contract_query(|gateway, ctx| gateway.total_locked_amount(ctx))
        .unwrap();
    assert_eq!(total, coin(1000));
}

// === Expiry ===

#[test]
fn test_lock_expires_on_unlock_date_and_is_purged() {
    let mut app = setup();
    deliver(&mut app, vec![delegate(alice(), 1000)]).unwrap();
    deliver(&mut app, vec![lock(alice(), "2026-07-15", 1000)]).unwrap();
    app.slash(&validator(), dec!(0.5)).unwrap();

    // Day before unlock: still locked, half exposed
    app.advance_days(180);
    assert_eq!(locked(&mut app, &alice()), 1000);
    assert!(app.evm_transfer(&alice(), &bob(), &[coin(1000)]).is_err());

    app.advance_days(1);
    assert_eq!(locked(&mut app, &alice()), 0);
    app.evm_transfer(&alice(), &bob(), &[coin(1000)]).unwrap();

    assert_eq!(app.end_block().unwrap(), 1);
    assert!(get_locks(app.store(), &alice()).unwrap().is_empty());
    assert!(get_expiration_amount(app.store(), &date("2026-07-15"), &alice())
        .unwrap()
        .is_zero());
    assert!(app.audit().unwrap().is_consistent());

    // Nothing left to purge
    assert_eq!(app.end_block().unwrap(), 0);
}

// === Queries ===

fn seed_query_locks(app: &mut SimApp) {
    deliver(app, vec![delegate(alice(), 1000), delegate(bob(), 500)]).unwrap();
    deliver(
        app,
        vec![
            lock(alice(), "2026-08-01", 100),
            lock(alice(), "2027-01-15", 200),
            lock(alice(), "2027-06-01", 300),
            lock(bob(), "2027-01-15", 500),
        ],
    )
    .unwrap();
}

#[test]
fn test_query_locks_paginates() {
    let mut app = setup();
    seed_query_locks(&mut app);

    let first = app
        .query(|keeper, ctx| keeper.locks(ctx, &alice().to_string(), &PageRequest::with_limit(2)))
        .unwrap();
    assert_eq!(first.locks.len(), 2);
    assert_eq!(first.locks[0].unlock_date, date("2026-08-01"));
    assert_eq!(first.pagination.total, 3);
    let next_key = first.pagination.next_key.unwrap();

    let second = app
        .query(|keeper, ctx| keeper.locks(ctx, &alice().to_string(), &PageRequest::with_key(next_key, 2)))
        .unwrap();
    assert_eq!(second.locks.len(), 1);
    assert_eq!(second.locks[0].amount, coin(300));
    assert!(second.pagination.next_key.is_none());

    let err = app
        .query(|keeper, ctx| keeper.locks(ctx, "", &PageRequest::default()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    let err = app
        .query(|keeper, ctx| keeper.locks(ctx, "not-an-address", &PageRequest::default()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);
}

#[test]
fn test_query_active_locks_orders_by_date_then_address() {
    let mut app = setup();
    seed_query_locks(&mut app);

    let page = PageRequest {
        limit: 3,
        count_total: true,
        ..PageRequest::default()
    };
    let first = app.query(|keeper, ctx| keeper.active_locks(ctx, &page)).unwrap();
    let seen: Vec<(Address, UnlockDate)> = first
        .locks
        .iter()
        .map(|l| (l.address, l.unlock_date))
        .collect();
    assert_eq!(
        seen,
        vec![
            (alice(), date("2026-08-01")),
            (alice(), date("2027-01-15")),
            (bob(), date("2027-01-15")),
        ]
    );
    assert_eq!(first.pagination.total, 4);

    let next_key = first.pagination.next_key.unwrap();
    let second = app
        .query(|keeper, ctx| keeper.active_locks(ctx, &PageRequest::with_key(next_key, 3)))
        .unwrap();
    assert_eq!(second.locks.len(), 1);
    assert_eq!(second.locks[0].unlock_date, date("2027-06-01"));
    assert!(second.pagination.next_key.is_none());
}

#[test]
fn test_query_totals_follow_block_day() {
    let mut app = setup();
    seed_query_locks(&mut app);

    let total = app.query(|keeper, ctx| keeper.total_locked_amount(ctx)).unwrap();
    assert_eq!(total, coin(1100));

    // Past the first unlock date, before any purge
    app.advance_days(200);
    let total = app.query(|keeper, ctx| keeper.total_locked_amount(ctx)).unwrap();
    assert_eq!(total, coin(1000));

    let locks = app
        .query(|keeper, ctx| keeper.locks(ctx, &alice().to_string(), &PageRequest::default()))
        .unwrap();
    assert_eq!(locks.pagination.total, 2);
}

#[test]
fn test_query_account_locks() {
    let mut app = setup();
    seed_query_locks(&mut app);

    let addresses = vec![alice().to_string(), bob().to_string(), carol().to_string()];
    let first = app
        .query(|keeper, ctx| keeper.account_locks(ctx, &addresses, &PageRequest::with_limit(2)))
        .unwrap();
    assert_eq!(first.accounts.len(), 2);
    assert_eq!(first.accounts[0].address, alice());
    assert_eq!(first.accounts[0].locks.len(), 3);
    assert_eq!(first.accounts[1].locks.len(), 1);
    assert_eq!(first.pagination.total, 3);

    let next_key = first.pagination.next_key.unwrap();
    let second = app
        .query(|keeper, ctx| keeper.account_locks(ctx, &addresses, &PageRequest::with_key(next_key, 2)))
        .unwrap();
    assert_eq!(second.accounts.len(), 1);
    assert_eq!(second.accounts[0].address, carol());
    assert!(second.accounts[0].locks.is_empty());

    let err = app
        .query(|keeper, ctx| keeper.account_locks(ctx, &[], &PageRequest::default()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

// === Invariant under mixed activity ===

#[test]
fn test_invariant_holds_across_mixed_activity() {
    let mut app = setup();
    let everyone = [alice(), bob(), carol()];

    let steps: Vec<Vec<TxMsg>> = vec![
        vec![delegate(alice(), 800)],
        vec![lock(alice(), "2027-01-15", 500)],
        vec![lock(alice(), "2027-06-01", 400)],
        vec![undelegate(alice(), 200)],
        vec![undelegate(alice(), 400)],
        vec![send(alice(), carol(), 1000)],
        vec![
            delegate(bob(), 300),
            lock(bob(), "2026-09-01", 300),
            undelegate(bob(), 1),
        ],
        vec![delegate(bob(), 300), lock(bob(), "2026-09-01", 300)],
        vec![extend(
            alice(),
            vec![Extension::new("2027-01-15", "2027-12-01", coin(250))],
        )],
        vec![send(carol(), bob(), 10)],
    ];

    for msgs in steps {
        let _ = deliver(&mut app, msgs);
        assert_invariant(&mut app, &everyone);
    }

    assert_eq!(locked(&mut app, &alice()), 500);
    assert_eq!(locked(&mut app, &bob()), 300);
}

// === Snapshots ===

#[test]
fn test_snapshot_roundtrip_restores_locks() -> anyhow::Result<()> {
    let mut app = setup();
    seed_query_locks(&mut app);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.jsonl");
    let written = app.export_snapshot(&path)?;
    assert!(written > 0);

    let mut restored = SimApp::new(LockupConfig::default(), utsc(), today())?;
    assert_eq!(restored.import_snapshot(&path)?, written);
    restored.begin_block(today());

    assert_eq!(locked(&mut restored, &alice()), 600);
    assert_eq!(locked(&mut restored, &bob()), 500);
    assert_eq!(balance(&mut restored, &alice()), balance(&mut app, &alice()));
    assert!(restored.audit()?.is_consistent());

    // The restored chain keeps enforcing the invariant
    let err = deliver(&mut restored, vec![undelegate(bob(), 1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientDelegations);
    Ok(())
}
