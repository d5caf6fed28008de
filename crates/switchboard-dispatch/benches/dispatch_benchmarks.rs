//! Benchmarks for the coordinator loop with stub capabilities.
//!
//! Measures orchestration overhead only: classification, dispatch, review
//! and history bookkeeping, with every capability answering instantly.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use switchboard_core::config::RejectionPolicy;
use switchboard_core::types::{Message, MessageRole};
use switchboard_dispatch::mock::{CannedRole, ScriptedClassifier, ScriptedReviewer};
use switchboard_dispatch::{
    ConversationState, Coordinator, CoordinatorSettings, ReviewDecision, RoleAgent, RoleRegistry,
    SupportRole,
};

fn build_coordinator(reviewer: ScriptedReviewer, settings: CoordinatorSettings) -> Coordinator<SupportRole> {
    let registry = RoleRegistry::<SupportRole>::complete(|role| {
        Arc::new(CannedRole::new(&format!("{} answer", role))) as Arc<dyn RoleAgent>
    });
    Coordinator::new(
        Arc::new(ScriptedClassifier::always_route("billing")),
        registry,
        Arc::new(reviewer),
        settings,
    )
    .expect("Failed to build coordinator")
}

/// Six prior turns, matching the default history window.
fn prior_turns() -> Vec<Message> {
    (0..6)
        .map(|i| {
            let role = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            Message::prior(role, format!("earlier turn number {}", i))
        })
        .collect()
}

fn bench_single_pass(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");
    let coordinator = build_coordinator(ScriptedReviewer::passthrough(), CoordinatorSettings::default());

    c.bench_function("run_single_pass_approved", |b| {
        b.iter(|| {
            let state = ConversationState::with_prior(
                prior_turns(),
                "I was overcharged on my last bill",
            )
            .expect("valid question");
            rt.block_on(coordinator.run(state)).expect("run succeeds")
        })
    });
}

fn bench_reroute_to_limit(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");
    let settings = CoordinatorSettings {
        rejection_policy: RejectionPolicy::Reroute,
        max_reroutes: 4,
        ..CoordinatorSettings::default()
    };
    let coordinator = build_coordinator(
        ScriptedReviewer::always(ReviewDecision::rejected("incomplete")),
        settings,
    );

    c.bench_function("run_reroute_four_rejections", |b| {
        b.iter(|| {
            let state = ConversationState::with_prior(
                prior_turns(),
                "I was overcharged on my last bill",
            )
            .expect("valid question");
            rt.block_on(coordinator.run(state)).expect("run succeeds")
        })
    });
}

criterion_group!(benches, bench_single_pass, bench_reroute_to_limit);
criterion_main!(benches);
