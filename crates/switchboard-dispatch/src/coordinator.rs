//! Coordinator: drives one run through route, role, review and final.
//!
//! Each step depends on the previous step's output, so capability calls are
//! strictly sequential. Nothing is retried except through the review
//! rejection cycle, which is bounded by the configured policy.

use std::sync::Arc;

use switchboard_core::config::{
    required_steps, ClassifierView, CoordinatorConfig, RejectionPolicy,
};
use switchboard_core::types::{Message, MessageRole, Origin};
use tracing::{debug, info, warn};

use crate::capability::{Classifier, Directive, ReviewAgent, Route, RoutingDecision, Verdict};
use crate::error::RunError;
use crate::machine::{validate_transition, Stage};
use crate::registry::RoleRegistry;
use crate::role::Role;
use crate::state::{ConversationState, Target};

/// Prefix of the history entry recording a rejected candidate.
const REJECTION_PREFIX: &str = "The reviewer rejected the previous answer: ";

/// Coordinator settings, resolved from [`CoordinatorConfig`].
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub rejection_policy: RejectionPolicy,
    pub max_reroutes: u32,
    pub max_steps: u32,
    pub classifier_view: ClassifierView,
    pub apology_text: String,
}

impl From<&CoordinatorConfig> for CoordinatorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            rejection_policy: config.rejection_policy,
            max_reroutes: config.max_reroutes,
            max_steps: config.max_steps,
            classifier_view: config.classifier_view,
            apology_text: config.apology_text.clone(),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&CoordinatorConfig::default())
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The reviewer approved a candidate.
    Approved,
    /// The classifier signalled completion with its own final message.
    ClassifierFinished,
    /// The reviewer rejected and the apology policy ended the run.
    Apology,
    /// The reviewer rejected `max_reroutes` times in a row.
    RerouteLimit,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Approved => write!(f, "approved"),
            Termination::ClassifierFinished => write!(f, "classifier_finished"),
            Termination::Apology => write!(f, "apology"),
            Termination::RerouteLimit => write!(f, "reroute_limit"),
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome<R: Role> {
    /// Terminal message for the caller.
    pub final_text: String,
    pub verdict: Verdict,
    pub termination: Termination,
    pub state: ConversationState<R>,
    /// Every stage visited, starting with `Route` and ending with `Final`.
    pub transitions: Vec<Stage<R>>,
    pub role_invocations: u32,
    pub review_invocations: u32,
    pub rejections: u32,
}

impl<R: Role> RunOutcome<R> {
    /// Roles dispatched to, in order.
    pub fn roles_visited(&self) -> Vec<R> {
        self.transitions
            .iter()
            .filter_map(|stage| match stage {
                Stage::Role(role) => Some(*role),
                _ => None,
            })
            .collect()
    }
}

/// Per-run bookkeeping that is not part of the conversation itself.
struct Progress<R: Role> {
    stage: Stage<R>,
    transitions: Vec<Stage<R>>,
    role_invocations: u32,
    review_invocations: u32,
    rejections: u32,
    ending: Option<(String, Verdict, Termination)>,
}

impl<R: Role> Progress<R> {
    fn new() -> Self {
        Self {
            stage: Stage::Route,
            transitions: vec![Stage::Route],
            role_invocations: 0,
            review_invocations: 0,
            rejections: 0,
            ending: None,
        }
    }

    fn advance(&mut self, next: Stage<R>, max_steps: u32) -> Result<(), RunError> {
        validate_transition(self.stage, next)?;
        // `transitions` holds the initial stage too
        if self.transitions.len() as u32 > max_steps {
            return Err(RunError::StepLimit(max_steps));
        }
        debug!(from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
        self.transitions.push(next);
        Ok(())
    }
}

/// The state machine driver.
pub struct Coordinator<R: Role> {
    classifier: Arc<dyn Classifier>,
    registry: RoleRegistry<R>,
    reviewer: Arc<dyn ReviewAgent>,
    settings: CoordinatorSettings,
}

impl<R: Role> Coordinator<R> {
    /// Create a coordinator. Fails if no role is registered, or if
    /// `max_steps` is too small for the longest run the rejection policy
    /// allows.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        registry: RoleRegistry<R>,
        reviewer: Arc<dyn ReviewAgent>,
        settings: CoordinatorSettings,
    ) -> Result<Self, RunError> {
        if registry.is_empty() {
            return Err(RunError::Configuration(
                "role registry is empty".to_string(),
            ));
        }
        let required = required_steps(settings.rejection_policy, settings.max_reroutes);
        if settings.max_steps < required {
            return Err(RunError::Configuration(format!(
                "max_steps is {} but the rejection policy needs at least {}",
                settings.max_steps, required
            )));
        }
        Ok(Self {
            classifier,
            registry,
            reviewer,
            settings,
        })
    }

    pub fn registry(&self) -> &RoleRegistry<R> {
        &self.registry
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Drive `state` to the final stage.
    ///
    /// Any contract violation or capability failure aborts the run and
    /// returns the error; no partial answer is produced.
    pub async fn run(&self, mut state: ConversationState<R>) -> Result<RunOutcome<R>, RunError> {
        let mut progress = Progress::new();

        while !progress.stage.is_terminal() {
            let next = match progress.stage {
                Stage::Route => self.route_step(&mut state, &mut progress).await?,
                Stage::Role(role) => self.role_step(role, &mut state, &mut progress).await?,
                Stage::Review => self.review_step(&mut state, &mut progress).await?,
                Stage::Final => break,
            };
            progress.advance(next, self.settings.max_steps)?;
        }

        let (final_text, verdict, termination) = progress.ending.ok_or_else(|| {
            RunError::Configuration("run reached final without a terminal message".to_string())
        })?;

        info!(
            termination = %termination,
            roles = progress.role_invocations,
            reviews = progress.review_invocations,
            rejections = progress.rejections,
            "Run complete"
        );

        Ok(RunOutcome {
            final_text,
            verdict,
            termination,
            state,
            transitions: progress.transitions,
            role_invocations: progress.role_invocations,
            review_invocations: progress.review_invocations,
            rejections: progress.rejections,
        })
    }

    /// Validate a raw classifier decision against the registered alphabet.
    pub fn interpret(&self, decision: RoutingDecision) -> Result<Route<R>, RunError> {
        if decision.is_terminal() {
            let message = decision.final_output.unwrap_or_default();
            if message.trim().is_empty() {
                return Err(RunError::contract(
                    "classifier",
                    "terminal decision without final_output",
                ));
            }
            return Ok(Route::Finish { message });
        }

        let role = self.registry.resolve(&decision.target)?;
        if decision.action.trim().is_empty() {
            return Err(RunError::contract(
                "classifier",
                format!("decision for `{}` has no action", role),
            ));
        }
        Ok(Route::Dispatch {
            role,
            directive: Directive {
                action: decision.action,
                information: decision.information,
            },
        })
    }

    async fn route_step(
        &self,
        state: &mut ConversationState<R>,
        progress: &mut Progress<R>,
    ) -> Result<Stage<R>, RunError> {
        let view = state.classifier_view(self.settings.classifier_view);
        let decision = self
            .classifier
            .classify(&view)
            .await
            .map_err(|e| RunError::from_capability("classifier", e))?;

        match self.interpret(decision)? {
            Route::Dispatch { role, directive } => {
                debug!(role = %role, action = %directive.action, "Classifier dispatched");
                state.set_next_target(Target::Role(role));
                state.push(Message::new(
                    MessageRole::System,
                    directive.render(),
                    Some(Origin::Classifier),
                ));
                state.set_plan(directive);
                Ok(Stage::Role(role))
            }
            Route::Finish { message } => {
                debug!("Classifier finished the conversation");
                state.set_next_target(Target::Finish);
                state.push(Message::new(
                    MessageRole::Assistant,
                    message.clone(),
                    Some(Origin::Classifier),
                ));
                progress.ending = Some((message, Verdict::Approved, Termination::ClassifierFinished));
                Ok(Stage::Final)
            }
        }
    }

    async fn role_step(
        &self,
        role: R,
        state: &mut ConversationState<R>,
        progress: &mut Progress<R>,
    ) -> Result<Stage<R>, RunError> {
        let agent = self
            .registry
            .get(role)
            .ok_or_else(|| RunError::contract("classifier", format!("role `{}` is not registered", role)))?;
        let directive = state.plan().cloned().ok_or_else(|| {
            RunError::Configuration(format!("no directive recorded before dispatch to `{}`", role))
        })?;
        let context = state.latest_user_message().to_string();

        progress.role_invocations += 1;
        let answer = agent
            .respond(&directive, &context)
            .await
            .map_err(|e| RunError::from_capability(role.id(), e))?;
        if answer.trim().is_empty() {
            return Err(RunError::contract(role.id(), "empty answer"));
        }

        debug!(role = %role, chars = answer.len(), "Role answered");
        state.push(Message::new(
            MessageRole::Assistant,
            answer,
            Some(Origin::Role(role.id().to_string())),
        ));
        Ok(Stage::Review)
    }

    async fn review_step(
        &self,
        state: &mut ConversationState<R>,
        progress: &mut Progress<R>,
    ) -> Result<Stage<R>, RunError> {
        let candidate = state
            .latest_role_answer()
            .map(|m| m.content.clone())
            .ok_or_else(|| RunError::Configuration("review reached without a candidate".to_string()))?;

        progress.review_invocations += 1;
        let decision = self
            .reviewer
            .review(state.original_request(), &candidate)
            .await
            .map_err(|e| RunError::from_capability("reviewer", e))?;
        if decision.text.trim().is_empty() {
            return Err(RunError::contract("reviewer", "empty review text"));
        }

        match decision.verdict {
            Verdict::Approved => {
                state.push(Message::new(
                    MessageRole::Assistant,
                    decision.text.clone(),
                    Some(Origin::Reviewer),
                ));
                progress.ending = Some((decision.text, Verdict::Approved, Termination::Approved));
                Ok(Stage::Final)
            }
            Verdict::Rejected => {
                progress.rejections += 1;
                warn!(
                    rejections = progress.rejections,
                    policy = ?self.settings.rejection_policy,
                    "Reviewer rejected candidate"
                );
                match self.settings.rejection_policy {
                    RejectionPolicy::Apology => {
                        self.apologize(state, progress, Termination::Apology);
                        Ok(Stage::Final)
                    }
                    RejectionPolicy::Reroute if progress.rejections >= self.settings.max_reroutes => {
                        self.apologize(state, progress, Termination::RerouteLimit);
                        Ok(Stage::Final)
                    }
                    RejectionPolicy::Reroute => {
                        state.push(Message::new(
                            MessageRole::User,
                            format!("{}{}", REJECTION_PREFIX, decision.text),
                            Some(Origin::Reviewer),
                        ));
                        Ok(Stage::Route)
                    }
                }
            }
        }
    }

    fn apologize(
        &self,
        state: &mut ConversationState<R>,
        progress: &mut Progress<R>,
        termination: Termination,
    ) {
        let text = self.settings.apology_text.clone();
        state.push(Message::new(
            MessageRole::Assistant,
            text.clone(),
            Some(Origin::Coordinator),
        ));
        progress.ending = Some((text, Verdict::Rejected, termination));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ReviewDecision;
    use crate::error::CapabilityError;
    use crate::mock::{CannedRole, ScriptedClassifier, ScriptedReviewer};
    use crate::role::SupportRole;

    struct Fixture {
        classifier: Arc<ScriptedClassifier>,
        billing: Arc<CannedRole>,
        technical: Arc<CannedRole>,
        general: Arc<CannedRole>,
        reviewer: Arc<ScriptedReviewer>,
    }

    impl Fixture {
        fn new(classifier: ScriptedClassifier, reviewer: ScriptedReviewer) -> Self {
            Self {
                classifier: Arc::new(classifier),
                billing: Arc::new(CannedRole::new("billing answer")),
                technical: Arc::new(CannedRole::new("technical answer")),
                general: Arc::new(CannedRole::new("general answer")),
                reviewer: Arc::new(reviewer),
            }
        }

        fn coordinator(&self, settings: CoordinatorSettings) -> Coordinator<SupportRole> {
            let mut registry = RoleRegistry::new();
            registry.register(SupportRole::Billing, self.billing.clone());
            registry.register(SupportRole::Technical, self.technical.clone());
            registry.register(SupportRole::GeneralInfo, self.general.clone());
            Coordinator::new(self.classifier.clone(), registry, self.reviewer.clone(), settings)
                .unwrap()
        }
    }

    fn reroute(max_reroutes: u32) -> CoordinatorSettings {
        CoordinatorSettings {
            rejection_policy: RejectionPolicy::Reroute,
            max_reroutes,
            ..CoordinatorSettings::default()
        }
    }

    fn question() -> ConversationState<SupportRole> {
        ConversationState::new("I was overcharged on my last bill").unwrap()
    }

    #[test]
    fn test_new_rejects_empty_registry() {
        let result = Coordinator::<SupportRole>::new(
            Arc::new(ScriptedClassifier::always_route("billing")),
            RoleRegistry::new(),
            Arc::new(ScriptedReviewer::passthrough()),
            CoordinatorSettings::default(),
        );
        assert!(matches!(result, Err(RunError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_dispatches_to_exactly_the_named_role() {
        for role in SupportRole::all() {
            let fx = Fixture::new(
                ScriptedClassifier::always_route(role.id()),
                ScriptedReviewer::passthrough(),
            );
            let outcome = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap();
            assert_eq!(outcome.roles_visited(), vec![*role]);
            assert_eq!(
                fx.billing.invocations() + fx.technical.invocations() + fx.general.invocations(),
                1
            );
        }
    }

    #[tokio::test]
    async fn test_overcharge_goes_only_to_billing() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::passthrough(),
        );
        let outcome = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap();

        assert_eq!(fx.billing.invocations(), 1);
        assert_eq!(fx.technical.invocations(), 0);
        assert_eq!(fx.general.invocations(), 0);
        assert_eq!(outcome.final_text, "billing answer");
        assert_eq!(
            outcome.transitions,
            vec![
                Stage::Route,
                Stage::Role(SupportRole::Billing),
                Stage::Review,
                Stage::Final
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_role_is_contract_violation() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("sales"),
            ScriptedReviewer::passthrough(),
        );
        let err = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(
            fx.billing.invocations() + fx.technical.invocations() + fx.general.invocations(),
            0
        );
        assert_eq!(fx.reviewer.calls(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_role_is_contract_violation() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("technical"),
            ScriptedReviewer::passthrough(),
        );
        let mut registry = RoleRegistry::new();
        registry.register(SupportRole::Billing, fx.billing.clone() as Arc<dyn crate::RoleAgent>);
        let coordinator = Coordinator::new(
            fx.classifier.clone(),
            registry,
            fx.reviewer.clone(),
            CoordinatorSettings::default(),
        )
        .unwrap();
        let err = coordinator.run(question()).await.unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(fx.billing.invocations(), 0);
    }

    #[tokio::test]
    async fn test_approved_text_is_final_verbatim() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::always(ReviewDecision::approved(
                "A refund of $12.40 has been issued.",
            )),
        );
        let outcome = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap();

        assert_eq!(outcome.final_text, "A refund of $12.40 has been issued.");
        assert_eq!(outcome.verdict, Verdict::Approved);
        assert_eq!(outcome.termination, Termination::Approved);
        assert_eq!(fx.classifier.calls(), 1);
        assert_eq!(fx.reviewer.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejection_under_apology_policy() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::always(ReviewDecision::rejected("does not answer the question")),
        );
        let settings = CoordinatorSettings::default();
        let apology = settings.apology_text.clone();
        let outcome = fx.coordinator(settings).run(question()).await.unwrap();

        assert_eq!(outcome.final_text, apology);
        assert_eq!(outcome.verdict, Verdict::Rejected);
        assert_eq!(outcome.termination, Termination::Apology);
        assert_eq!(fx.billing.invocations(), 1);
        assert_eq!(fx.classifier.calls(), 1);
        assert!(outcome.role_invocations <= 2);
        assert!(outcome.review_invocations <= 2);
    }

    #[tokio::test]
    async fn test_reroute_cap_bounds_rejections() {
        for k in 1..=4 {
            let fx = Fixture::new(
                ScriptedClassifier::always_route("technical"),
                ScriptedReviewer::always(ReviewDecision::rejected("incomplete")),
            );
            let outcome = fx.coordinator(reroute(k)).run(question()).await.unwrap();

            assert_eq!(outcome.termination, Termination::RerouteLimit);
            assert_eq!(outcome.rejections, k);
            assert_eq!(outcome.role_invocations, k);
            assert_eq!(outcome.review_invocations, k);
            assert_eq!(fx.technical.invocations() as u32, k);
        }
    }

    #[tokio::test]
    async fn test_reroute_then_approve() {
        let fx = Fixture::new(
            ScriptedClassifier::new(vec![
                Ok(RoutingDecision::dispatch("general_info", "answer", "")),
                Ok(RoutingDecision::dispatch("billing", "explain the charge", "last bill")),
            ]),
            ScriptedReviewer::new(vec![
                Ok(ReviewDecision::rejected("this is a billing question")),
                Ok(ReviewDecision::approved("final billing answer")),
            ]),
        );
        let outcome = fx.coordinator(reroute(3)).run(question()).await.unwrap();

        assert_eq!(outcome.final_text, "final billing answer");
        assert_eq!(
            outcome.roles_visited(),
            vec![SupportRole::GeneralInfo, SupportRole::Billing]
        );
        assert_eq!(outcome.rejections, 1);

        // second classification sees the rejection and not its own directive
        let second_view = &fx.classifier.seen()[1];
        assert!(second_view
            .iter()
            .any(|m| m.origin == Some(Origin::Reviewer) && m.content.contains("billing question")));
        assert!(second_view.iter().all(|m| m.origin != Some(Origin::Classifier)));

        // the second role sees the reviewer feedback as its context
        assert!(fx.billing.contexts()[0].contains("billing question"));
    }

    #[tokio::test]
    async fn test_reviewer_always_gets_original_request() {
        let fx = Fixture::new(
            ScriptedClassifier::new(vec![
                Ok(RoutingDecision::dispatch("billing", "paraphrase one", "x")),
                Ok(RoutingDecision::dispatch("technical", "paraphrase two", "y")),
                Ok(RoutingDecision::dispatch("general_info", "paraphrase three", "z")),
            ]),
            ScriptedReviewer::always(ReviewDecision::rejected("try again")),
        );
        let outcome = fx.coordinator(reroute(3)).run(question()).await.unwrap();

        let seen = fx.reviewer.seen();
        assert_eq!(seen.len(), 3);
        for (original, _) in &seen {
            assert_eq!(original, "I was overcharged on my last bill");
        }
        assert_eq!(seen[1].1, "technical answer");
        assert_eq!(outcome.state.original_request(), "I was overcharged on my last bill");
    }

    #[tokio::test]
    async fn test_classifier_finish_skips_roles_and_review() {
        let fx = Fixture::new(
            ScriptedClassifier::always(RoutingDecision::finish("Hello! How can I help today?")),
            ScriptedReviewer::passthrough(),
        );
        let outcome = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap();

        assert_eq!(outcome.final_text, "Hello! How can I help today?");
        assert_eq!(outcome.verdict, Verdict::Approved);
        assert_eq!(outcome.termination, Termination::ClassifierFinished);
        assert_eq!(outcome.transitions, vec![Stage::Route, Stage::Final]);
        assert_eq!(fx.reviewer.calls(), 0);
        assert_eq!(outcome.state.next_target(), Some(Target::Finish));
    }

    #[tokio::test]
    async fn test_finish_without_output_is_contract_violation() {
        let mut decision = RoutingDecision::finish("");
        decision.final_output = None;
        let fx = Fixture::new(ScriptedClassifier::always(decision), ScriptedReviewer::passthrough());
        let err = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[tokio::test]
    async fn test_dispatch_without_action_is_contract_violation() {
        let fx = Fixture::new(
            ScriptedClassifier::always(RoutingDecision::dispatch("billing", "  ", "info")),
            ScriptedReviewer::passthrough(),
        );
        let err = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(fx.billing.invocations(), 0);
    }

    #[tokio::test]
    async fn test_capability_failures_are_not_retried() {
        let fx = Fixture::new(
            ScriptedClassifier::failing(CapabilityError::Timeout(30)),
            ScriptedReviewer::passthrough(),
        );
        let err = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap_err();
        assert!(err.is_capability_failure());
        assert_eq!(fx.classifier.calls(), 1);

        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::new(vec![Err(CapabilityError::Transport("reset".into()))]),
        );
        let err = fx.coordinator(reroute(3)).run(question()).await.unwrap_err();
        assert!(err.is_capability_failure());
        assert_eq!(fx.reviewer.calls(), 1);
        assert_eq!(fx.billing.invocations(), 1);
    }

    #[tokio::test]
    async fn test_role_failure_aborts_run() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::passthrough(),
        );
        let mut registry = RoleRegistry::new();
        registry.register(
            SupportRole::Billing,
            Arc::new(CannedRole::failing(CapabilityError::Upstream("500".into())))
                as Arc<dyn crate::RoleAgent>,
        );
        let coordinator = Coordinator::new(
            fx.classifier.clone(),
            registry,
            fx.reviewer.clone(),
            CoordinatorSettings::default(),
        )
        .unwrap();
        let err = coordinator.run(question()).await.unwrap_err();
        assert!(err.is_capability_failure());
        assert!(err.to_string().starts_with("billing call failed"));
        assert_eq!(fx.reviewer.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_review_is_contract_violation() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::new(vec![Err(CapabilityError::Malformed("no verdict".into()))]),
        );
        let err = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_step_limit_stops_runaway_loop() {
        let mut progress = Progress::<SupportRole>::new();
        progress.advance(Stage::Role(SupportRole::Billing), 2).unwrap();
        progress.advance(Stage::Review, 2).unwrap();
        let err = progress.advance(Stage::Route, 2).unwrap_err();
        assert!(matches!(err, RunError::StepLimit(2)));
    }

    #[test]
    fn test_new_rejects_reroute_cap_beyond_step_ceiling() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::always(ReviewDecision::rejected("no")),
        );
        let mut registry = RoleRegistry::new();
        registry.register(SupportRole::Billing, fx.billing.clone());
        let result = Coordinator::new(fx.classifier.clone(), registry, fx.reviewer.clone(), reroute(6));
        assert!(matches!(result, Err(RunError::Configuration(msg)) if msg.contains("max_steps")));
    }

    #[tokio::test]
    async fn test_largest_cap_within_default_ceiling_ends_with_apology() {
        let fx = Fixture::new(
            ScriptedClassifier::always_route("billing"),
            ScriptedReviewer::always(ReviewDecision::rejected("no")),
        );
        let settings = reroute(5);
        assert_eq!(settings.max_steps, 16);
        let outcome = fx.coordinator(settings).run(question()).await.unwrap();
        assert_eq!(outcome.termination, Termination::RerouteLimit);
        assert_eq!(outcome.rejections, 5);
        assert_eq!(outcome.transitions.len(), 16);
    }

    #[tokio::test]
    async fn test_history_tags_every_step() {
        let fx = Fixture::new(
            ScriptedClassifier::always(RoutingDecision::dispatch(
                "billing",
                "handle the user query",
                "overcharge",
            )),
            ScriptedReviewer::always(ReviewDecision::approved("reviewed")),
        );
        let outcome = fx.coordinator(CoordinatorSettings::default()).run(question()).await.unwrap();
        let history = outcome.state.history();

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].origin, Some(Origin::Caller));
        assert_eq!(history[1].origin, Some(Origin::Classifier));
        assert_eq!(
            history[1].content,
            "Conduct the following action: handle the user query with this information: overcharge"
        );
        assert_eq!(history[2].origin, Some(Origin::Role("billing".into())));
        assert_eq!(history[2].content, "billing answer");
        assert_eq!(history[3].origin, Some(Origin::Reviewer));
        assert_eq!(history[3].content, "reviewed");

        // role received the parsed directive and the caller's question
        assert_eq!(fx.billing.directives()[0].information, "overcharge");
        assert_eq!(fx.billing.contexts()[0], "I was overcharged on my last bill");
    }

    #[tokio::test]
    async fn test_full_view_includes_bookkeeping() {
        let fx = Fixture::new(
            ScriptedClassifier::new(vec![
                Ok(RoutingDecision::dispatch("billing", "a", "")),
                Ok(RoutingDecision::finish("done")),
            ]),
            ScriptedReviewer::always(ReviewDecision::rejected("no")),
        );
        let settings = CoordinatorSettings {
            classifier_view: ClassifierView::Full,
            ..reroute(5)
        };
        let outcome = fx.coordinator(settings).run(question()).await.unwrap();

        assert_eq!(outcome.termination, Termination::ClassifierFinished);
        let second_view = &fx.classifier.seen()[1];
        assert!(second_view.iter().any(|m| m.origin == Some(Origin::Classifier)));
    }

    #[test]
    fn test_settings_from_config() {
        let config = CoordinatorConfig {
            rejection_policy: RejectionPolicy::Reroute,
            max_reroutes: 7,
            ..CoordinatorConfig::default()
        };
        let settings = CoordinatorSettings::from(&config);
        assert_eq!(settings.rejection_policy, RejectionPolicy::Reroute);
        assert_eq!(settings.max_reroutes, 7);
        assert_eq!(settings.max_steps, config.max_steps);
        assert_eq!(settings.apology_text, config.apology_text);
    }

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::Approved.to_string(), "approved");
        assert_eq!(Termination::RerouteLimit.to_string(), "reroute_limit");
    }
}
