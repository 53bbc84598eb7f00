//! Promo ledger.
//!
//! A promo can be redeemed at most once per user. The `(promo_id, user_id)`
//! unique index is what enforces that under concurrency; the read-side check
//! in [`validate_for_redemption`] only produces the friendlier error first.

use crate::{
    db,
    entities::{promo, promo_redemption, Promo, PromoRedemption},
    errors::{PromoError, ServiceError},
    events::{Event, EventSender},
    metrics::PROMO_REDEMPTIONS,
    services::{cart::CartService, pricing},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const MAX_CODE_LEN: usize = 8;

/// Fields for a new promo
#[derive(Debug, Clone)]
pub struct NewPromo {
    pub code: String,
    pub description: Option<String>,
    pub discount_percent: i32,
    pub min_qualifying_amount: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

/// Outcome of a successful promo check
#[derive(Debug, Clone, Serialize)]
pub struct PromoCheck {
    pub code: String,
    pub discount_percent: i32,
    pub cart_total: Decimal,
    pub discounted_total: Decimal,
}

/// Applies the redemption rules in order: expiry, prior use, minimum amount.
pub fn validate_for_redemption(
    promo: &promo::Model,
    already_redeemed: bool,
    cart_total: Decimal,
    today: NaiveDate,
) -> Result<(), PromoError> {
    if promo.is_expired_on(today) {
        return Err(PromoError::Expired(promo.code.clone()));
    }
    if already_redeemed {
        return Err(PromoError::AlreadyUsed(promo.code.clone()));
    }
    if cart_total < promo.min_qualifying_amount {
        return Err(PromoError::MinimumNotMet {
            code: promo.code.clone(),
            minimum: promo.min_qualifying_amount,
            total: cart_total,
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct PromoService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    cart: CartService,
    min_amount_floor: Decimal,
}

impl PromoService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        min_amount_floor: Decimal,
    ) -> Self {
        let cart = CartService::new(db.clone(), event_sender.clone());
        Self {
            db,
            event_sender,
            cart,
            min_amount_floor,
        }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_promo(
        &self,
        owner_id: Uuid,
        input: NewPromo,
    ) -> Result<promo::Model, ServiceError> {
        let code = input.code.trim().to_string();
        if code.is_empty() || code.chars().count() > MAX_CODE_LEN {
            return Err(ServiceError::ValidationError(format!(
                "promo code must be 1 to {} characters",
                MAX_CODE_LEN
            )));
        }
        if !(1..=100).contains(&input.discount_percent) {
            return Err(ServiceError::ValidationError(
                "discount percent must be between 1 and 100".into(),
            ));
        }
        if input.min_qualifying_amount < self.min_amount_floor {
            return Err(ServiceError::ValidationError(format!(
                "minimum qualifying amount must be at least {}",
                self.min_amount_floor
            )));
        }

        let model = promo::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            owner_id: Set(owner_id),
            description: Set(input.description),
            discount_percent: Set(input.discount_percent),
            min_qualifying_amount: Set(pricing::round_money(input.min_qualifying_amount)),
            expiry_date: Set(input.expiry_date),
            is_expired: Set(false),
            created_at: Set(Utc::now()),
        };

        let saved = model.insert(&*self.db).await.map_err(|e| {
            if db::is_unique_violation(&e) {
                ServiceError::ValidationError(format!("promo code {} already exists", code))
            } else {
                ServiceError::db_error(e)
            }
        })?;

        info!(promo_id = %saved.id, "Promo created");
        self.event_sender
            .send_or_log(Event::PromoCreated {
                promo_id: saved.id,
                code: saved.code.clone(),
            })
            .await;
        Ok(saved)
    }

    pub async fn lookup(&self, code: &str) -> Result<promo::Model, ServiceError> {
        Self::lookup_in(&*self.db, code).await
    }

    /// Finds a promo by code. Surrounding whitespace is ignored, matching
    /// how `create_promo` stores codes.
    pub async fn lookup_in<C: ConnectionTrait>(
        conn: &C,
        code: &str,
    ) -> Result<promo::Model, ServiceError> {
        let code = code.trim();
        Promo::find()
            .filter(promo::Column::Code.eq(code))
            .one(conn)
            .await?
            .ok_or_else(|| PromoError::NotFound(code.to_string()).into())
    }

    pub async fn has_redeemed_in<C: ConnectionTrait>(
        conn: &C,
        promo_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let count = PromoRedemption::find()
            .filter(promo_redemption::Column::PromoId.eq(promo_id))
            .filter(promo_redemption::Column::UserId.eq(user_id))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Validates a code for the user without redeeming it.
    ///
    /// When `cart_total` is omitted the user's current cart total is used.
    #[instrument(skip(self))]
    pub async fn check_promo(
        &self,
        user_id: Uuid,
        code: &str,
        cart_total: Option<Decimal>,
    ) -> Result<PromoCheck, ServiceError> {
        let promo = self.lookup(code).await?;
        let already = Self::has_redeemed_in(&*self.db, promo.id, user_id).await?;
        let total = match cart_total {
            Some(total) => pricing::round_money(total),
            None => self.cart.total(user_id).await?,
        };

        validate_for_redemption(&promo, already, total, Utc::now().date_naive())?;

        Ok(PromoCheck {
            code: promo.code,
            discount_percent: promo.discount_percent,
            cart_total: total,
            discounted_total: pricing::apply_promo(total, promo.discount_percent),
        })
    }

    /// Records a redemption. Callers validate first.
    pub async fn redeem(&self, promo: &promo::Model, user_id: Uuid) -> Result<(), ServiceError> {
        Self::redeem_in(&*self.db, promo, user_id).await?;
        self.event_sender
            .send_or_log(Event::PromoRedeemed {
                promo_id: promo.id,
                user_id,
            })
            .await;
        Ok(())
    }

    /// Inserts the redemption row; a second row for the same pair is refused
    /// by the unique index and surfaces as `AlreadyUsed`.
    pub async fn redeem_in<C: ConnectionTrait>(
        conn: &C,
        promo: &promo::Model,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        promo_redemption::ActiveModel {
            id: Set(Uuid::new_v4()),
            promo_id: Set(promo.id),
            user_id: Set(user_id),
            redeemed_at: Set(Utc::now()),
        }
        .insert(conn)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ServiceError::from(PromoError::AlreadyUsed(promo.code.clone()))
            } else {
                ServiceError::db_error(e)
            }
        })?;

        PROMO_REDEMPTIONS.inc();
        info!(promo_id = %promo.id, user_id = %user_id, "Promo redeemed");
        Ok(())
    }

    /// Users who redeemed the promo, earliest first.
    pub async fn redeemed_by(&self, promo_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let rows = PromoRedemption::find()
            .filter(promo_redemption::Column::PromoId.eq(promo_id))
            .order_by_asc(promo_redemption::Column::RedeemedAt)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    /// Soft-expires a promo by code.
    #[instrument(skip(self))]
    pub async fn expire_promo(&self, code: &str) -> Result<promo::Model, ServiceError> {
        let promo = self.lookup(code).await?;
        if promo.is_expired {
            return Ok(promo);
        }

        let mut active: promo::ActiveModel = promo.into();
        active.is_expired = Set(true);
        let updated = active.update(&*self.db).await?;

        info!(promo_id = %updated.id, "Promo expired");
        self.event_sender
            .send_or_log(Event::PromoExpired {
                promo_id: updated.id,
                code: updated.code.clone(),
            })
            .await;
        Ok(updated)
    }

    /// Flags every promo whose expiry date is before `today`.
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self, today: NaiveDate) -> Result<u64, ServiceError> {
        let overdue = Promo::find()
            .filter(promo::Column::IsExpired.eq(false))
            .filter(promo::Column::ExpiryDate.lt(today))
            .all(&*self.db)
            .await?;
        if overdue.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = overdue.iter().map(|p| p.id).collect();
        let result = Promo::update_many()
            .col_expr(promo::Column::IsExpired, Expr::value(true))
            .filter(promo::Column::Id.is_in(ids))
            .exec(&*self.db)
            .await?;

        for promo in overdue {
            self.event_sender
                .send_or_log(Event::PromoExpired {
                    promo_id: promo.id,
                    code: promo.code,
                })
                .await;
        }

        info!(expired = result.rows_affected, %today, "Overdue promos expired");
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn promo(expiry: Option<NaiveDate>, expired: bool) -> promo::Model {
        promo::Model {
            id: Uuid::new_v4(),
            code: "SAVE10".into(),
            owner_id: Uuid::new_v4(),
            description: None,
            discount_percent: 10,
            min_qualifying_amount: dec!(150.00),
            expiry_date: expiry,
            is_expired: expired,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_qualifying_total() {
        let today = Utc::now().date_naive();
        assert!(validate_for_redemption(&promo(None, false), false, dec!(180.00), today).is_ok());
        assert!(validate_for_redemption(&promo(Some(today), false), false, dec!(150.00), today).is_ok());
    }

    #[test]
    fn checks_run_in_order() {
        let today = Utc::now().date_naive();
        let yesterday = today - Duration::days(1);

        assert_matches!(
            validate_for_redemption(&promo(Some(yesterday), false), true, dec!(1.00), today),
            Err(PromoError::Expired(_))
        );
        assert_matches!(
            validate_for_redemption(&promo(None, true), true, dec!(1.00), today),
            Err(PromoError::Expired(_))
        );
        assert_matches!(
            validate_for_redemption(&promo(None, false), true, dec!(1.00), today),
            Err(PromoError::AlreadyUsed(_))
        );
        assert_matches!(
            validate_for_redemption(&promo(None, false), false, dec!(149.99), today),
            Err(PromoError::MinimumNotMet { minimum, total, .. })
                if minimum == dec!(150.00) && total == dec!(149.99)
        );
    }
}
