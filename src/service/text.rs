use super::{Response, TextRequest};
use crate::{
    Error, Result,
    config::TextFlavor,
    generator::{TextModel, TextParams},
    session::{SessionStore, TextSession},
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stateful chat dispatcher: threads each user's transcript into the next turn.
pub struct TextService {
    model: Arc<dyn TextModel>,
    flavor: TextFlavor,
    defaults: TextParams,
    sessions: SessionStore<TextSession>,
}

/// Outcome of one generation: the new session value and the user-visible reply.
struct Turn {
    session: TextSession,
    reply: String,
}

impl TextService {
    pub fn new(model: Arc<dyn TextModel>, flavor: TextFlavor) -> Self {
        Self {
            model,
            flavor,
            defaults: TextParams::defaults_for(flavor),
            sessions: SessionStore::new(),
        }
    }

    pub fn flavor(&self) -> TextFlavor {
        self.flavor
    }

    pub fn sessions(&self) -> &SessionStore<TextSession> {
        &self.sessions
    }

    /// Handles one turn and folds every failure into the error envelope.
    pub async fn process_request(&self, user_id: &str, request: TextRequest) -> Response {
        self.process(user_id, request).await.into()
    }

    /// Handles one turn.
    ///
    /// Fails with [`Error::Validation`] on empty input or parameters the
    /// backend cannot honour, and with [`Error::Generation`] when the model
    /// fails. The user's session is only replaced after a complete generation.
    pub async fn process(&self, user_id: &str, request: TextRequest) -> Result<Response> {
        if request.input.is_empty() {
            return Err(Error::validation("No input text provided"));
        }

        info!(
            "Processing {} text request for user: {}",
            self.flavor, user_id
        );

        let params = request.resolve(&self.defaults);

        let _guard = self.sessions.lock_user(user_id).await;
        let history = self.sessions.get(user_id);

        let turn = match self.flavor {
            TextFlavor::Transcript => self.transcript_turn(history, &request.input, &params).await,
            TextFlavor::Dialogue => self.dialogue_turn(history, &request.input, &params).await,
        }
        .map_err(|e| match e {
            Error::Validation(_) => e,
            e => {
                error!("Text generation failed for user {}: {}", user_id, e);
                Error::generation(format!("Text generation failed: {}", e.detail()))
            }
        })?;

        self.sessions.put(user_id, turn.session);

        Ok(Response::Text {
            response: turn.reply,
        })
    }

    /// Plain text continuation. The reply is everything after the stored
    /// history, so it starts with the new input itself.
    async fn transcript_turn(
        &self,
        history: Option<TextSession>,
        input: &str,
        params: &TextParams,
    ) -> Result<Turn> {
        let history = match history {
            Some(TextSession::Transcript(text)) => text,
            Some(TextSession::Dialogue(_)) => {
                return Err(Error::internal("dialogue session in a transcript service"));
            }
            None => String::new(),
        };

        let full_input = format!("{history}{input}");
        let input_ids = self.model.encode(&full_input)?;
        debug!("Transcript context is {} tokens", input_ids.len());

        let output_ids = self.model.generate(&input_ids, params).await?;
        let generated = self.model.decode(&output_ids)?;

        let reply = match generated.strip_prefix(history.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => {
                warn!("Decoded output does not start with the stored history");
                generated.get(history.len()..).unwrap_or_default().to_string()
            }
        };

        Ok(Turn {
            session: TextSession::Transcript(generated),
            reply,
        })
    }

    /// Turn-based chat. The new input is closed with the end-of-turn marker
    /// and appended to the token history; the reply is only the model's part.
    async fn dialogue_turn(
        &self,
        history: Option<TextSession>,
        input: &str,
        params: &TextParams,
    ) -> Result<Turn> {
        let mut input_ids = match history {
            Some(TextSession::Dialogue(ids)) => ids,
            Some(TextSession::Transcript(_)) => {
                return Err(Error::internal("transcript session in a dialogue service"));
            }
            None => Vec::new(),
        };

        let turn = format!("{input}{}", self.model.eos_token());
        input_ids.extend(self.model.encode(&turn)?);
        debug!("Dialogue context is {} tokens", input_ids.len());

        let output_ids = self.model.generate(&input_ids, params).await?;
        if !output_ids.starts_with(&input_ids) {
            return Err(Error::generation("model output does not extend its input"));
        }

        let reply = self.model.decode(&output_ids[input_ids.len()..])?;

        Ok(Turn {
            session: TextSession::Dialogue(output_ids),
            reply,
        })
    }
}
