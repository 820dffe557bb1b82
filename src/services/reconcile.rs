//! Turns provider payment events into enrollment state.
//!
//! Providers deliver at least once, so every path here is an idempotent
//! upsert or a no-op. Outcomes that should not be retried (guest purchases,
//! amount mismatches, unknown courses) are acknowledged rather than failed.

use std::fmt;

use tracing::{info, warn};

use crate::{
    errors::AppError,
    models::{enrollment::{Enrollment, PaidEnrollment}, money::Money},
    store::Store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Stripe,
    Paypal,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Stripe => "stripe",
            Provider::Paypal => "paypal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchaser {
    User(i64),
    Guest,
}

impl Purchaser {
    const GUEST: &'static str = "guest";

    /// Parses the marker stored in provider metadata. Anything that is not a
    /// user id is a guest.
    pub fn from_marker(raw: Option<&str>) -> Self {
        raw.and_then(|r| r.trim().parse().ok())
            .map_or(Purchaser::Guest, Purchaser::User)
    }

    pub fn marker(self) -> String {
        match self {
            Purchaser::User(id) => id.to_string(),
            Purchaser::Guest => Self::GUEST.to_string(),
        }
    }
}

impl From<Option<i64>> for Purchaser {
    fn from(user_id: Option<i64>) -> Self {
        user_id.map_or(Purchaser::Guest, Purchaser::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub provider: Provider,
    pub provider_payment_id: String,
    pub course_id: i64,
    pub purchaser: Purchaser,
    pub amount: Money,
    /// Lowercase ISO code as reported by the provider.
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailure {
    pub provider: Provider,
    pub provider_payment_id: String,
    pub course_id: i64,
    pub purchaser: Purchaser,
}

#[derive(Debug)]
pub enum ReconcileOutcome {
    Enrolled(Enrollment),
    GuestPurchase,
    AmountMismatch { expected: Money, received: Money },
    UnknownCourse,
    UnknownPurchaser,
    PaymentFailed { updated: bool },
}

impl ReconcileOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            ReconcileOutcome::Enrolled(_) => "enrolled",
            ReconcileOutcome::GuestPurchase => "guest_purchase",
            ReconcileOutcome::AmountMismatch { .. } => "amount_mismatch",
            ReconcileOutcome::UnknownCourse => "unknown_course",
            ReconcileOutcome::UnknownPurchaser => "unknown_purchaser",
            ReconcileOutcome::PaymentFailed { .. } => "payment_failed",
        }
    }
}

/// Grants the course when the captured amount and currency match the list
/// price in the store currency.
pub async fn reconcile(
    store: &dyn Store,
    payment: PaymentConfirmation,
    currency: &str,
) -> Result<ReconcileOutcome, AppError> {
    let PaymentConfirmation {
        provider,
        provider_payment_id,
        course_id,
        purchaser,
        amount,
        currency: paid_in,
    } = payment;

    let Purchaser::User(user_id) = purchaser else {
        warn!(
            %provider,
            payment_id = %provider_payment_id,
            course_id,
            amount = %amount,
            "guest purchase received, no enrollment created"
        );
        return Ok(ReconcileOutcome::GuestPurchase);
    };

    let Some(course) = store.find_course(course_id).await? else {
        warn!(%provider, payment_id = %provider_payment_id, course_id, "payment for unknown course");
        return Ok(ReconcileOutcome::UnknownCourse);
    };

    if amount != course.price || !paid_in.eq_ignore_ascii_case(currency) {
        warn!(
            %provider,
            payment_id = %provider_payment_id,
            course_id,
            user_id,
            expected_currency = currency,
            received_currency = %paid_in,
            expected = %course.price,
            received = %amount,
            "payment amount does not match course price"
        );
        return Ok(ReconcileOutcome::AmountMismatch {
            expected: course.price,
            received: amount,
        });
    }

    if store.find_user(user_id).await?.is_none() {
        warn!(%provider, payment_id = %provider_payment_id, user_id, "payment for unknown user");
        return Ok(ReconcileOutcome::UnknownPurchaser);
    }

    let enrollment = store
        .upsert_paid_enrollment(PaidEnrollment {
            user_id,
            course_id,
            payment_id: provider_payment_id,
            payment_amount: amount,
        })
        .await?;

    info!(
        %provider,
        enrollment_id = enrollment.id,
        user_id,
        course_id,
        amount = %amount,
        "payment reconciled"
    );
    Ok(ReconcileOutcome::Enrolled(enrollment))
}

/// Flags a pending enrollment as failed. Completed enrollments are never
/// downgraded and no rows are created.
pub async fn record_failure(
    store: &dyn Store,
    failure: PaymentFailure,
) -> Result<ReconcileOutcome, AppError> {
    let Purchaser::User(user_id) = failure.purchaser else {
        info!(
            provider = %failure.provider,
            payment_id = %failure.provider_payment_id,
            course_id = failure.course_id,
            "guest payment failed"
        );
        return Ok(ReconcileOutcome::PaymentFailed { updated: false });
    };

    let updated = store
        .mark_payment_failed(user_id, failure.course_id, &failure.provider_payment_id)
        .await?
        .is_some();

    warn!(
        provider = %failure.provider,
        payment_id = %failure.provider_payment_id,
        user_id,
        course_id = failure.course_id,
        updated,
        "payment failed"
    );
    Ok(ReconcileOutcome::PaymentFailed { updated })
}
