// Inventory service - points and reward ownership per user.
//
// Grants, revokes and purchases all follow the same shape: look the reward up
// in the warehouse, load the user's record, apply the change in memory, save
// the whole record back. `times_bought` on the reward counts every copy that
// ever left the warehouse.

use super::inventory_models::{BundleLine, GrantOutcome, PointsChange, RevokeOutcome, UserData};
use super::user_store::UserStore;
use crate::core::rewards::{Reward, RewardKind, WarehouseStore};
use crate::core::storage::{StoreError, WriteGate};
use std::sync::Arc;

/// Largest stack a single grant may add.
pub const MAX_GRANT_QUANTITY: u32 = 1000;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Reward `{0}` does not exist")]
    UnknownReward(String),
    #[error("{0}")]
    Validation(String),
    #[error("The user does not own `{0}`")]
    NotOwned(String),
    #[error("Cannot remove {requested} of `{reward_id}`, the user only holds {held}")]
    InsufficientQuantity {
        reward_id: String,
        requested: u32,
        held: usize,
    },
    #[error("Not enough points: {required} needed, {available} available")]
    InsufficientPoints { required: u64, available: u64 },
    #[error("`{0}` is not for sale")]
    NotForSale(String),
    #[error("`{0}` is already owned")]
    AlreadyOwned(String),
    #[error("`{0}` is not a title")]
    NotATitle(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// What a successful purchase changed.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub reward: Reward,
    pub points: PointsChange,
    pub total_held: usize,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct InventoryService<W: WarehouseStore, U: UserStore> {
    rewards: Arc<W>,
    users: Arc<U>,
    gate: WriteGate,
}

impl<W: WarehouseStore, U: UserStore> InventoryService<W, U> {
    pub fn new(rewards: Arc<W>, users: Arc<U>, gate: WriteGate) -> Self {
        Self {
            rewards,
            users,
            gate,
        }
    }

    /// A user's record, or an empty one if they never received anything.
    pub async fn profile(&self, user_id: u64) -> Result<UserData, InventoryError> {
        Ok(self.users.get_user(user_id).await?.unwrap_or_default())
    }

    /// Give `quantity` copies of a reward to a user.
    ///
    /// Only stackable items accept a quantity above one. Granting a
    /// non-stackable reward the user already owns is a no-op.
    pub async fn grant(
        &self,
        user_id: u64,
        reward_id: &str,
        quantity: u32,
    ) -> Result<(Reward, GrantOutcome), InventoryError> {
        let _guard = self.gate.enter().await;
        let reward = self.require_reward(reward_id).await?;
        check_quantity(&reward, quantity)?;

        let mut user = self.profile(user_id).await?;
        let outcome = apply_grant(&mut user, &reward, quantity);
        if let GrantOutcome::Granted { copies, .. } = outcome {
            self.users.save_user(user_id, user).await?;
            self.bump_times_bought(&reward.id, copies).await?;
            tracing::info!(user_id, reward_id = %reward.id, copies, "Reward granted");
        }
        Ok((reward, outcome))
    }

    /// Take `quantity` copies of a reward away from a user.
    ///
    /// Works for ids that already vanished from the warehouse as long as the
    /// id prefix tells us the kind, so stale inventory can still be cleaned.
    pub async fn revoke(
        &self,
        user_id: u64,
        reward_id: &str,
        quantity: u32,
    ) -> Result<(Option<Reward>, RevokeOutcome), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let reward_id = reward_id.trim();

        let _guard = self.gate.enter().await;
        let reward = self.rewards.get_reward(reward_id).await?;
        let kind = reward
            .as_ref()
            .map(|r| r.kind)
            .or_else(|| RewardKind::from_id(reward_id))
            .ok_or_else(|| InventoryError::UnknownReward(reward_id.to_string()))?;

        let mut user = self.profile(user_id).await?;
        let outcome = apply_revoke(&mut user, reward_id, kind, quantity)?;
        self.users.save_user(user_id, user).await?;

        tracing::info!(user_id, reward_id, removed = outcome.removed, "Reward revoked");
        Ok((reward, outcome))
    }

    pub async fn add_points(&self, user_id: u64, amount: u64) -> Result<PointsChange, InventoryError> {
        if amount == 0 {
            return Err(InventoryError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        let _guard = self.gate.enter().await;
        let mut user = self.profile(user_id).await?;
        let before = user.points;
        user.points = user.points.saturating_add(amount);
        let change = PointsChange {
            before,
            after: user.points,
        };
        self.users.save_user(user_id, user).await?;
        Ok(change)
    }

    /// Remove points, clamping the balance at zero. The returned change shows
    /// how much was actually removed.
    pub async fn remove_points(
        &self,
        user_id: u64,
        amount: u64,
    ) -> Result<PointsChange, InventoryError> {
        if amount == 0 {
            return Err(InventoryError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        let _guard = self.gate.enter().await;
        let mut user = self.profile(user_id).await?;
        let before = user.points;
        user.points = user.points.saturating_sub(amount);
        let change = PointsChange {
            before,
            after: user.points,
        };
        if change.before != change.after {
            self.users.save_user(user_id, user).await?;
        }
        Ok(change)
    }

    /// Spend points on one copy of a priced reward.
    pub async fn purchase(
        &self,
        user_id: u64,
        reward_id: &str,
    ) -> Result<PurchaseReceipt, InventoryError> {
        let _guard = self.gate.enter().await;
        let reward = self.require_reward(reward_id).await?;
        if !reward.is_for_sale() {
            return Err(InventoryError::NotForSale(reward.id));
        }

        let mut user = self.profile(user_id).await?;
        let total_held = match apply_grant(&mut user, &reward, 1) {
            GrantOutcome::Granted { total_held, .. } => total_held,
            GrantOutcome::AlreadyOwned => return Err(InventoryError::AlreadyOwned(reward.id)),
        };
        if user.points < reward.price {
            return Err(InventoryError::InsufficientPoints {
                required: reward.price,
                available: user.points,
            });
        }
        let before = user.points;
        user.points -= reward.price;
        let points = PointsChange {
            before,
            after: user.points,
        };

        self.users.save_user(user_id, user).await?;
        self.bump_times_bought(&reward.id, 1).await?;

        tracing::info!(user_id, reward_id = %reward.id, price = reward.price, "Reward purchased");
        Ok(PurchaseReceipt {
            reward,
            points,
            total_held,
        })
    }

    pub async fn equip_title(&self, user_id: u64, title_id: &str) -> Result<Reward, InventoryError> {
        let _guard = self.gate.enter().await;
        let reward = self.require_reward(title_id).await?;
        if reward.kind != RewardKind::Title {
            return Err(InventoryError::NotATitle(reward.id));
        }
        let mut user = self.profile(user_id).await?;
        if !user.titles.contains(&reward.id) {
            return Err(InventoryError::NotOwned(reward.id));
        }
        user.equipped_title = Some(reward.id.clone());
        self.users.save_user(user_id, user).await?;
        Ok(reward)
    }

    /// Returns the id of the title that was equipped, if any.
    pub async fn unequip_title(&self, user_id: u64) -> Result<Option<String>, InventoryError> {
        let _guard = self.gate.enter().await;
        let mut user = self.profile(user_id).await?;
        let previous = user.equipped_title.take();
        if previous.is_some() {
            self.users.save_user(user_id, user).await?;
        }
        Ok(previous)
    }

    /// Grant one copy of each reward in an event bundle.
    pub async fn grant_bundle(
        &self,
        user_id: u64,
        reward_ids: &[String],
    ) -> Result<Vec<BundleLine>, InventoryError> {
        let _guard = self.gate.enter().await;
        let mut user = self.profile(user_id).await?;
        let mut lines = Vec::with_capacity(reward_ids.len());
        let mut granted = Vec::new();

        for reward_id in reward_ids {
            match self.rewards.get_reward(reward_id).await? {
                None => lines.push(BundleLine::Missing(reward_id.clone())),
                Some(reward) => match apply_grant(&mut user, &reward, 1) {
                    GrantOutcome::Granted { .. } => {
                        granted.push(reward.id.clone());
                        lines.push(BundleLine::Granted(reward.id));
                    }
                    GrantOutcome::AlreadyOwned => lines.push(BundleLine::AlreadyOwned(reward.id)),
                },
            }
        }

        if !granted.is_empty() {
            self.users.save_user(user_id, user).await?;
            for reward_id in &granted {
                self.bump_times_bought(reward_id, 1).await?;
            }
        }
        Ok(lines)
    }

    async fn require_reward(&self, reward_id: &str) -> Result<Reward, InventoryError> {
        let reward_id = reward_id.trim();
        self.rewards
            .get_reward(reward_id)
            .await?
            .ok_or_else(|| InventoryError::UnknownReward(reward_id.to_string()))
    }

    async fn bump_times_bought(&self, reward_id: &str, copies: u32) -> Result<(), InventoryError> {
        if let Some(mut reward) = self.rewards.get_reward(reward_id).await? {
            reward.times_bought = reward.times_bought.saturating_add(copies as u64);
            self.rewards.save_reward(reward).await?;
        }
        Ok(())
    }
}

// ============================================================================
// INVENTORY RULES
// ============================================================================

fn check_quantity(reward: &Reward, quantity: u32) -> Result<(), InventoryError> {
    if quantity == 0 {
        return Err(InventoryError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if quantity > MAX_GRANT_QUANTITY {
        return Err(InventoryError::Validation(format!(
            "At most {} copies can be granted at once",
            MAX_GRANT_QUANTITY
        )));
    }
    if quantity > 1 && !reward.is_stackable() {
        return Err(InventoryError::Validation(format!(
            "`{}` is not stackable, only one copy can be held",
            reward.id
        )));
    }
    Ok(())
}

fn apply_grant(user: &mut UserData, reward: &Reward, quantity: u32) -> GrantOutcome {
    let id = reward.id.clone();
    let newly_added = match reward.kind {
        RewardKind::Badge => user.badges.insert(id),
        RewardKind::Title => user.titles.insert(id),
        RewardKind::Item if reward.is_stackable() => {
            user.items
                .extend(std::iter::repeat(id).take(quantity as usize));
            return GrantOutcome::Granted {
                copies: quantity,
                total_held: user.item_count(&reward.id),
            };
        }
        RewardKind::Item => {
            if user.items.contains(&id) {
                false
            } else {
                user.items.push(id);
                true
            }
        }
    };

    if newly_added {
        GrantOutcome::Granted {
            copies: 1,
            total_held: 1,
        }
    } else {
        GrantOutcome::AlreadyOwned
    }
}

fn apply_revoke(
    user: &mut UserData,
    reward_id: &str,
    kind: RewardKind,
    quantity: u32,
) -> Result<RevokeOutcome, InventoryError> {
    let held = match kind {
        RewardKind::Badge => usize::from(user.badges.contains(reward_id)),
        RewardKind::Title => usize::from(user.titles.contains(reward_id)),
        RewardKind::Item => user.item_count(reward_id),
    };
    if held == 0 {
        return Err(InventoryError::NotOwned(reward_id.to_string()));
    }
    if (quantity as usize) > held {
        return Err(InventoryError::InsufficientQuantity {
            reward_id: reward_id.to_string(),
            requested: quantity,
            held,
        });
    }

    match kind {
        RewardKind::Badge => {
            user.badges.remove(reward_id);
        }
        RewardKind::Title => {
            user.titles.remove(reward_id);
            if user.equipped_title.as_deref() == Some(reward_id) {
                user.equipped_title = None;
            }
        }
        RewardKind::Item => {
            let mut to_remove = quantity as usize;
            // Drop the most recently granted copies first.
            let mut index = user.items.len();
            while to_remove > 0 && index > 0 {
                index -= 1;
                if user.items[index] == reward_id {
                    user.items.remove(index);
                    to_remove -= 1;
                }
            }
        }
    }

    Ok(RevokeOutcome {
        removed: quantity,
        remaining: held - quantity as usize,
    })
}

// ============================================================================
// TESTS
// ============================================================================
