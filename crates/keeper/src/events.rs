//! Lockup events

use lockup_core::{Address, Amount, Coin, UnlockDate, ValidatorAddress};
use lockup_store::Event;
use rust_decimal::Decimal;
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Lock,
    LockExtended,
    LockExpired,
    /// Staking delegate, emitted on behalf of the staking module
    Delegate,
}

pub const ATTRIBUTE_KEY_ADDRESS: &str = "address";
pub const ATTRIBUTE_KEY_AMOUNT: &str = "amount";
pub const ATTRIBUTE_KEY_UNLOCK_DATE: &str = "unlock_date";
pub const ATTRIBUTE_KEY_OLD_UNLOCK_DATE: &str = "old_unlock_date";
pub const ATTRIBUTE_KEY_VALIDATOR: &str = "validator";
pub const ATTRIBUTE_KEY_DELEGATOR: &str = "delegator";
pub const ATTRIBUTE_KEY_NEW_SHARES: &str = "new_shares";

pub fn lock_event(address: &Address, unlock_date: &UnlockDate, amount: Amount) -> Event {
    Event::new(EventType::Lock.to_string())
        .attr(ATTRIBUTE_KEY_ADDRESS, address)
        .attr(ATTRIBUTE_KEY_UNLOCK_DATE, unlock_date)
        .attr(ATTRIBUTE_KEY_AMOUNT, amount)
}

pub fn lock_extended_event(
    address: &Address,
    old_unlock_date: &UnlockDate,
    unlock_date: &UnlockDate,
    amount: Amount,
) -> Event {
    Event::new(EventType::LockExtended.to_string())
        .attr(ATTRIBUTE_KEY_ADDRESS, address)
        .attr(ATTRIBUTE_KEY_OLD_UNLOCK_DATE, old_unlock_date)
        .attr(ATTRIBUTE_KEY_UNLOCK_DATE, unlock_date)
        .attr(ATTRIBUTE_KEY_AMOUNT, amount)
}

pub fn lock_expired_event(address: &Address, unlock_date: &UnlockDate, amount: Amount) -> Event {
    Event::new(EventType::LockExpired.to_string())
        .attr(ATTRIBUTE_KEY_ADDRESS, address)
        .attr(ATTRIBUTE_KEY_UNLOCK_DATE, unlock_date)
        .attr(ATTRIBUTE_KEY_AMOUNT, amount)
}

pub fn delegate_event(
    validator: &ValidatorAddress,
    delegator: &Address,
    amount: &Coin,
    new_shares: Decimal,
) -> Event {
    Event::new(EventType::Delegate.to_string())
        .attr(ATTRIBUTE_KEY_VALIDATOR, validator)
        .attr(ATTRIBUTE_KEY_DELEGATOR, delegator)
        .attr(ATTRIBUTE_KEY_AMOUNT, amount)
        .attr(ATTRIBUTE_KEY_NEW_SHARES, new_shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockup_core::address::ADDRESS_LEN;

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::Lock.to_string(), "lock");
        assert_eq!(EventType::LockExtended.to_string(), "lock_extended");
        assert_eq!(EventType::LockExpired.as_ref(), "lock_expired");
        assert_eq!("delegate".parse::<EventType>().unwrap(), EventType::Delegate);
    }

    #[test]
    fn test_lock_extended_attributes() {
        let addr = Address::from_bytes([0xa1; ADDRESS_LEN]);
        let from: UnlockDate = "2026-01-01".parse().unwrap();
        let to: UnlockDate = "2027-01-01".parse().unwrap();
        let event = lock_extended_event(&addr, &from, &to, Amount::new(1000));

        assert_eq!(event.kind, "lock_extended");
        assert_eq!(event.get(ATTRIBUTE_KEY_OLD_UNLOCK_DATE), Some("2026-01-01"));
        assert_eq!(event.get(ATTRIBUTE_KEY_UNLOCK_DATE), Some("2027-01-01"));
        assert_eq!(event.get(ATTRIBUTE_KEY_AMOUNT), Some("1000"));
    }
}
