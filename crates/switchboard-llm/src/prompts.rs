//! Prompt construction.
//!
//! Prompts are derived from the role alphabet, so adding a role to an enum
//! is enough for the classifier to learn about it.

use switchboard_core::types::{Message, MessageRole, Origin};
use switchboard_dispatch::{Directive, Role, TERMINAL_SENTINEL};

use crate::backend::PromptMessage;

/// System prompt for the classifier of alphabet `R`.
pub fn classifier_prompt<R: Role>() -> String {
    let roles: String = R::all()
        .iter()
        .map(|role| format!("- {}: {}\n", role.id(), role.description()))
        .collect();
    let example = R::all().first().map(|r| r.id()).unwrap_or("role");

    format!(
        "You are the router of a {domain} team.\n\
         \n\
         Classify the conversation and hand it to exactly one of these roles:\n\
         {roles}\n\
         Reply with a single JSON object and nothing else.\n\
         \n\
         To hand off:\n\
         {{\"next\": \"{example}\", \"action\": \"handle the user query\", \"information\": \"<the relevant user message>\"}}\n\
         \n\
         When the conversation needs no specialist (greetings, small talk, a request you must decline), \
         or a reviewer has already produced a satisfactory answer:\n\
         {{\"next\": \"{finish}\", \"final_output\": \"<your reply to the user>\"}}\n\
         \n\
         Rules:\n\
         - Do not answer specialist questions yourself.\n\
         - Use only the role names listed above.\n\
         - If a reviewer rejected an earlier answer, route again using its feedback.\n\
         - Reply in the user's language.",
        domain = R::domain(),
        roles = roles,
        example = example,
        finish = TERMINAL_SENTINEL,
    )
}

/// System prompt for one role agent.
pub fn role_prompt<R: Role>(role: R) -> String {
    format!(
        "You are the {id} specialist of a {domain} team. You handle {description}.\n\
         Answer the request you are given directly and completely, in the user's language. \
         Do not mention other team members or internal routing.",
        id = role.id(),
        domain = R::domain(),
        description = role.description(),
    )
}

/// System prompt for the reviewer.
pub fn reviewer_prompt(domain: &str) -> String {
    format!(
        "You are the supervisor of a {domain} team.\n\
         You receive the user's original request and a candidate answer written by a specialist.\n\
         Verify that the answer is complete and accurate for the original request.\n\
         - If it is, approve it. You may lightly edit it for clarity.\n\
         - If it can be fixed, rewrite it and approve the rewrite.\n\
         - If it does not address the request, reject it and explain what is missing.\n\
         \n\
         Reply with a single JSON object and nothing else:\n\
         {{\"approval\": \"approved\" | \"rejected\", \"response\": \"<final answer or feedback>\"}}",
        domain = domain,
    )
}

/// Render conversation history for the classifier.
///
/// Role answers and reviewer notes are attributed so the classifier can
/// tell who said what.
pub fn classifier_messages<R: Role>(history: &[Message]) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(PromptMessage::system(classifier_prompt::<R>()));
    for message in history {
        let content = match &message.origin {
            Some(origin @ (Origin::Role(_) | Origin::Reviewer)) => {
                format!("[{}] {}", origin.label(), message.content)
            }
            _ => message.content.clone(),
        };
        messages.push(match message.role {
            MessageRole::User => PromptMessage::user(content),
            MessageRole::Assistant => PromptMessage::assistant(content),
            // directives are the router's own notes
            MessageRole::System => PromptMessage::assistant(content),
        });
    }
    messages
}

pub fn role_messages<R: Role>(role: R, directive: &Directive, context: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(role_prompt(role)),
        PromptMessage::user(context),
        PromptMessage::user(directive.render()),
    ]
}

pub fn reviewer_messages(domain: &str, original_request: &str, candidate: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(reviewer_prompt(domain)),
        PromptMessage::user(format!(
            "Original request:\n{}\n\nCandidate answer:\n{}",
            original_request, candidate
        )),
    ]
}
