//! Four-step order creation flow.
//!
//! Steps only move one at a time in either direction and stay within
//! `Language..=Preview`. Leaving the language step requires a language.

use shared::{domain::Language, protocol::OrderCreateData};
use tracing::info;

use crate::{
    error::{ClientError, ClientResult},
    notify::Notification,
    order_store::OrderStore,
    routes::Route,
};

pub const TOTAL_STEPS: u8 = 4;

pub const GENRES: &[&str] = &["pop", "rock", "hip-hop", "indie", "ballad", "folk"];
pub const MOODS: &[&str] = &["romantic", "happy", "sad", "motivational"];
pub const TEMPOS: &[&str] = &["slow", "medium", "fast"];
pub const OCCASIONS: &[&str] = &[
    "birthday",
    "anniversary",
    "wedding",
    "valentine",
    "graduation",
    "other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Language,
    Style,
    Occasion,
    Preview,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Language => 1,
            WizardStep::Style => 2,
            WizardStep::Occasion => 3,
            WizardStep::Preview => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Language => "Language",
            WizardStep::Style => "Style",
            WizardStep::Occasion => "Occasion",
            WizardStep::Preview => "Review",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            WizardStep::Language => Some(WizardStep::Style),
            WizardStep::Style => Some(WizardStep::Occasion),
            WizardStep::Occasion => Some(WizardStep::Preview),
            WizardStep::Preview => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Language => None,
            WizardStep::Style => Some(WizardStep::Language),
            WizardStep::Occasion => Some(WizardStep::Style),
            WizardStep::Preview => Some(WizardStep::Occasion),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub language: Option<Language>,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub tempo: Option<String>,
    pub occasion: Option<String>,
    pub recipient: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub navigate_to: Option<Route>,
    pub notification: Notification,
}

#[derive(Debug, Clone)]
pub struct CreationWizard {
    step: WizardStep,
    form: OrderForm,
}

impl Default for CreationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CreationWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Language,
            form: OrderForm::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &OrderForm {
        &self.form
    }

    pub fn progress_percent(&self) -> u8 {
        (u16::from(self.step.number()) * 100 / u16::from(TOTAL_STEPS)) as u8
    }

    pub fn set_language(&mut self, language: Language) {
        self.form.language = Some(language);
    }

    pub fn clear_language(&mut self) {
        self.form.language = None;
    }

    pub fn select_genre(&mut self, genre: &str) -> ClientResult<()> {
        self.form.genre = Some(pick("genre", GENRES, genre)?);
        Ok(())
    }

    pub fn select_mood(&mut self, mood: &str) -> ClientResult<()> {
        self.form.mood = Some(pick("mood", MOODS, mood)?);
        Ok(())
    }

    pub fn select_tempo(&mut self, tempo: &str) -> ClientResult<()> {
        self.form.tempo = Some(pick("tempo", TEMPOS, tempo)?);
        Ok(())
    }

    pub fn select_occasion(&mut self, occasion: &str) -> ClientResult<()> {
        self.form.occasion = Some(pick("occasion", OCCASIONS, occasion)?);
        Ok(())
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.form.recipient = recipient.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.form.notes = notes.into();
    }

    pub fn can_advance(&self) -> bool {
        self.form.language.is_some() && self.step.next().is_some()
    }

    /// Moves one step forward. Returns false when blocked.
    pub fn next(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.step.previous() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::Preview && self.form.language.is_some()
    }

    pub fn to_create_data(&self) -> ClientResult<OrderCreateData> {
        let language = self
            .form
            .language
            .ok_or_else(|| ClientError::Validation("select a language first".into()))?;
        Ok(OrderCreateData {
            language,
            genre: self.form.genre.clone(),
            mood: self.form.mood.clone(),
            tempo: self.form.tempo.clone(),
            occasion: self.form.occasion.clone(),
            recipient: non_blank(&self.form.recipient),
            notes: non_blank(&self.form.notes),
        })
    }

    /// Lines shown on the review step.
    pub fn summary(&self) -> Vec<String> {
        let form = &self.form;
        let mut lines = vec![
            format!(
                "Language: {}",
                form.language.map_or("Not selected", Language::display_name)
            ),
            format!("Genre: {}", form.genre.as_deref().unwrap_or("Not selected")),
            format!("Mood: {}", form.mood.as_deref().unwrap_or("Not selected")),
            format!("Tempo: {}", form.tempo.as_deref().unwrap_or("Not selected")),
            format!("Occasion: {}", form.occasion.as_deref().unwrap_or("Not selected")),
            format!(
                "Recipient: {}",
                non_blank(&form.recipient).as_deref().unwrap_or("Not specified")
            ),
        ];
        if let Some(notes) = non_blank(&form.notes) {
            lines.push(format!("Notes: {notes}"));
        }
        lines
    }

    /// Submits the collected form from the review step. On success the
    /// caller should navigate to the new order; on failure the wizard stays
    /// where it is.
    pub async fn submit(&self, orders: &OrderStore) -> SubmitOutcome {
        let draft = if self.can_submit() {
            self.to_create_data()
        } else {
            Err(ClientError::Validation(
                "finish every step before submitting".into(),
            ))
        };

        let result = match draft {
            Ok(draft) => orders.create_order(&draft).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(order) => {
                info!(order_id = %order.id, "wizard submitted order");
                SubmitOutcome {
                    navigate_to: Some(Route::OrderDetails(order.id)),
                    notification: Notification::success(
                        "Order created",
                        "Moving on to the lyrics...",
                    ),
                }
            }
            Err(err) => SubmitOutcome {
                navigate_to: None,
                notification: Notification::request_failed(&err),
            },
        }
    }
}

fn pick(field: &str, catalog: &[&str], value: &str) -> ClientResult<String> {
    let value = value.trim().to_ascii_lowercase();
    if catalog.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(ClientError::Validation(format!(
            "unknown {field} '{value}', expected one of: {}",
            catalog.join(", ")
        )))
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
