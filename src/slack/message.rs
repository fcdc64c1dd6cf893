use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::SlackOptions;

const ATTACHMENT_COLOR: &str = "#0000cc";
const FOOTER: &str = "Via: hookhub-forms";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlackMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Attachment {
    pub fallback: String,
    pub color: String,
    pub author_name: String,
    pub author_link: String,
    pub title: String,
    pub title_link: String,
    pub text: String,
    pub fields: Vec<Field>,
    pub footer: String,
    pub ts: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// Inputs for one message, already resolved against the form configuration.
pub struct MessageParams<'a> {
    pub form_id: &'a str,
    pub title: &'a str,
    pub options: SlackOptions,
    pub filter: &'a [String],
    pub include_answers: bool,
    /// Seconds since the epoch, stamped on the attachment.
    pub now: f64,
}

pub fn form_view_url(form_id: &str) -> String {
    format!("https://docs.google.com/forms/d/{form_id}/view")
}

/// Keep only answers whose question is in `filter`, in payload order.
/// An empty filter keeps everything.
pub fn filter_answers(answers: &Map<String, Value>, filter: &[String]) -> Map<String, Value> {
    if filter.is_empty() {
        return answers.clone();
    }

    answers
        .iter()
        .filter(|(question, _)| filter.iter().any(|f| f == *question))
        .map(|(question, answer)| (question.clone(), answer.clone()))
        .collect()
}

fn answer_text(answer: &Value) -> String {
    match answer {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(answer_text).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn build(params: &MessageParams<'_>, answers: &Map<String, Value>) -> SlackMessage {
    let with_attachment = params.include_answers || !params.filter.is_empty();

    let mut text = format!("There is a new entry for the {} form!", params.title);
    let mut attachments = Vec::new();

    if with_attachment {
        text.push_str("\r\r");

        let filtered = filter_answers(answers, params.filter);
        let lines: Vec<(String, String)> = filtered
            .iter()
            .map(|(question, answer)| (question.clone(), answer_text(answer)))
            .collect();

        let fallback = lines
            .iter()
            .map(|(q, a)| format!("- {q}: {a}"))
            .collect::<Vec<_>>()
            .join("\n");

        let fields = lines
            .into_iter()
            .map(|(title, value)| Field {
                title,
                value,
                short: false,
            })
            .collect();

        let link = form_view_url(params.form_id);
        attachments.push(Attachment {
            fallback,
            color: ATTACHMENT_COLOR.to_string(),
            author_name: params.title.to_string(),
            author_link: link.clone(),
            title: params.title.to_string(),
            title_link: link,
            text: "Form Results:".to_string(),
            fields,
            footer: FOOTER.to_string(),
            ts: params.now,
        });
    }

    SlackMessage {
        username: params.options.username.clone(),
        icon_emoji: params.options.icon_emoji.clone(),
        channel: params.options.channel.clone(),
        text,
        attachments,
    }
}
