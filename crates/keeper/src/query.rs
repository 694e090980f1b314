//! Read-only queries
//!
//! Every query filters with the same `is_locked(block_day, unlock_date)`
//! the guards use.

use crate::error::{LockupError, LockupResult};
use crate::keeper::Keeper;
use lockup_core::{is_locked, Address, Coin, UnlockDate};
use lockup_ledger::{get_locks, iterate_active, total_active};
use lockup_store::Context;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

/// Offset or cursor pagination. `key`, when set, wins over `offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub key: Option<Vec<u8>>,
    #[serde(default)]
    pub offset: u64,
    /// 0 means the configured default
    #[serde(default)]
    pub limit: u64,
    /// Only [`Keeper::active_locks`] needs a second pass to count; the other
    /// queries always fill `total`
    #[serde(default)]
    pub count_total: bool,
}

impl PageRequest {
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_key(key: Vec<u8>, limit: u64) -> Self {
        Self {
            key: Some(key),
            limit,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub next_key: Option<Vec<u8>>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockResource {
    pub unlock_date: UnlockDate,
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLockResource {
    pub address: Address,
    pub unlock_date: UnlockDate,
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLocksResource {
    pub address: Address,
    pub locks: Vec<LockResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLocksResponse {
    pub locks: Vec<LockResource>,
    pub pagination: PageResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryActiveLocksResponse {
    pub locks: Vec<ActiveLockResource>,
    pub pagination: PageResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountLocksResponse {
    pub accounts: Vec<AccountLocksResource>,
    pub pagination: PageResponse,
}

/// Split a comma-separated address list, trimming blanks
pub fn parse_address_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Offset cursors are the next offset as big-endian bytes
fn encode_offset(offset: u64) -> Vec<u8> {
    offset.to_be_bytes().to_vec()
}

fn decode_offset(key: &[u8]) -> LockupResult<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| LockupError::InvalidRequest(format!("invalid page key: {}", hex::encode(key))))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Slice `items` per the page request
fn paginate<T>(items: Vec<T>, page: &PageRequest, limit: u64) -> LockupResult<(Vec<T>, PageResponse)> {
    let total = items.len() as u64;
    let offset = match &page.key {
        Some(key) => decode_offset(key)?,
        None => page.offset,
    };
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);

    let next_key = (end < total).then(|| encode_offset(end));
    let items = items
        .into_iter()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect();
    Ok((items, PageResponse { next_key, total }))
}

impl Keeper {
    fn active_lock_resources(
        &self,
        ctx: &Context<'_>,
        address: &Address,
    ) -> LockupResult<Vec<LockResource>> {
        let today = ctx.block_day();
        Ok(get_locks(ctx.store(), address)?
            .into_iter()
            .filter(|lock| is_locked(today, &lock.unlock_date))
            .map(|lock| LockResource {
                unlock_date: lock.unlock_date,
                amount: Coin::new(lock.amount, self.bond_denom().clone()),
            })
            .collect())
    }

    /// Active locks of one address, oldest first
    pub fn locks(
        &self,
        ctx: &Context<'_>,
        address: &str,
        page: &PageRequest,
    ) -> LockupResult<QueryLocksResponse> {
        if address.trim().is_empty() {
            return Err(LockupError::InvalidRequest("address is required".to_string()));
        }
        let address: Address = address
            .parse()
            .map_err(|e| LockupError::InvalidAddress(format!("{address}: {e}")))?;

        let all = self.active_lock_resources(ctx, &address)?;
        let limit = self.config().page_limit(page.limit);
        let (locks, pagination) = paginate(all, page, limit)?;
        Ok(QueryLocksResponse { locks, pagination })
    }

    /// Global scan of the expiration index, resumable by raw index key
    pub fn active_locks(
        &self,
        ctx: &Context<'_>,
        page: &PageRequest,
    ) -> LockupResult<QueryActiveLocksResponse> {
        let today = ctx.block_day();
        let limit = self.config().page_limit(page.limit) as usize;
        let denom = self.bond_denom();

        let mut locks = Vec::new();
        let mut next_key = None;
        iterate_active(ctx.store(), today, page.key.as_deref(), |key, entry| {
            if locks.len() >= limit {
                next_key = Some(key.to_vec());
                return ControlFlow::Break(());
            }
            locks.push(ActiveLockResource {
                address: entry.address,
                unlock_date: entry.unlock_date,
                amount: Coin::new(entry.amount, denom.clone()),
            });
            ControlFlow::Continue(())
        })?;

        let total = if page.count_total {
            let mut count = 0u64;
            iterate_active(ctx.store(), today, None, |_, _| {
                count += 1;
                ControlFlow::Continue(())
            })?;
            count
        } else {
            0
        };

        Ok(QueryActiveLocksResponse {
            locks,
            pagination: PageResponse { next_key, total },
        })
    }

    /// Sum of every active lock, in the bond denom
    pub fn total_locked_amount(&self, ctx: &Context<'_>) -> LockupResult<Coin> {
        let total = total_active(ctx.store(), ctx.block_day())?;
        Ok(Coin::new(total, self.bond_denom().clone()))
    }

    /// Active locks for a batch of addresses. Pagination runs over the
    /// address list.
    pub fn account_locks(
        &self,
        ctx: &Context<'_>,
        addresses: &[String],
        page: &PageRequest,
    ) -> LockupResult<QueryAccountLocksResponse> {
        if addresses.is_empty() {
            return Err(LockupError::InvalidRequest(
                "at least one address is required".to_string(),
            ));
        }

        let limit = self.config().page_limit(page.limit);
        let (selected, pagination) = paginate(addresses.to_vec(), page, limit)?;

        let accounts = selected
            .iter()
            .map(|raw| {
                let address: Address = raw
                    .parse()
                    .map_err(|e| LockupError::InvalidAddress(format!("{raw}: {e}")))?;
                Ok(AccountLocksResource {
                    address,
                    locks: self.active_lock_resources(ctx, &address)?,
                })
            })
            .collect::<LockupResult<Vec<_>>>()?;

        Ok(QueryAccountLocksResponse {
            accounts,
            pagination,
        })
    }
}
