use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use voyage_core::llm::LanguageModel;
use voyage_core::repository::TripRepository;
use voyage_core::{CoreError, CoreResult};
use voyage_offer::FlightOfferGenerator;
use voyage_shared::{Component, ComponentResponse};

use crate::input::TripInput;
use crate::prompts::{build_prompts, cta_button, fallback_prompts, PromptPlanner};
use crate::reconciler::TripReconciler;

/// Reconcile the trip, then either offer flights or ask for what is missing.
pub struct ComponentOrchestrator {
    reconciler: TripReconciler,
    planner: PromptPlanner,
    offers: FlightOfferGenerator,
}

impl ComponentOrchestrator {
    pub fn new(trips: Arc<dyn TripRepository>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            reconciler: TripReconciler::new(trips, model.clone()),
            planner: PromptPlanner::new(model),
            offers: FlightOfferGenerator::new(),
        }
    }

    pub async fn respond(&self, input: &TripInput) -> CoreResult<ComponentResponse> {
        self.respond_at(input, Utc::now()).await
    }

    pub async fn respond_at(&self, input: &TripInput, now: DateTime<Utc>) -> CoreResult<ComponentResponse> {
        let trip = self.reconciler.reconcile(input).await?;

        if trip.is_complete() {
            let offers = self
                .offers
                .generate_at(&trip, now)
                .map_err(|e| CoreError::Upstream(e.to_string()))?;
            info!(trip_id = trip.id, "Trip complete, returning {} flight offers", offers.len());
            return Ok(ComponentResponse::new(
                trip.id,
                offers.into_iter().map(Component::Flight).collect(),
            ));
        }

        let prompts = match self.planner.decide(&trip, input).await {
            Ok(planned) if planned.is_empty() => {
                let label = self.planner.cta_label(&trip).await;
                return Ok(ComponentResponse::new(trip.id, vec![Component::Button(cta_button(&trip, label))]));
            }
            Ok(planned) => {
                let prompts = build_prompts(&trip, input, planned, now);
                if prompts.is_empty() {
                    fallback_prompts(&trip, input, now)
                } else {
                    prompts
                }
            }
            Err(e) => {
                warn!(trip_id = trip.id, "Prompt planning failed, using default questions: {}", e);
                fallback_prompts(&trip, input, now)
            }
        };

        Ok(ComponentResponse::new(
            trip.id,
            prompts.into_iter().map(Component::Prompt).collect(),
        ))
    }
}
