//! Line-oriented chat front end with per-user sessions.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use advisor_bot::{AdviserRegistry, Answer, FALLBACK_MESSAGE};
use advisor_core::model::Sport;
use parking_lot::Mutex;
use tracing::{Level, event};

pub const GREETING: &str = "Hola, soy tu asistente de apuestas deportivas. ¿Sobre qué deporte quieres apostar hoy? (fútbol o baloncesto)";
pub const RESET_MESSAGE: &str =
    "🔁 Conversación reiniciada. ¿Sobre qué deporte quieres apostar hoy? (fútbol o baloncesto)";
pub const CHOOSE_SPORT: &str = "Por favor escribe 'fútbol' o 'baloncesto' para comenzar.";

const RESET_KEYWORDS: [&str; 4] = ["reiniciar", "reset", "/reset", "volver a empezar"];
const EXIT_KEYWORDS: [&str; 3] = ["salir", "exit", "/quit"];

#[derive(Debug, Clone)]
struct Session {
    sport: Sport,
    history: Vec<Answer>,
    next_fact: Option<String>,
}

/// Conversation state for every user, owned by the front end rather than the engine.
#[derive(Debug, Default)]
pub struct ChatSessions {
    sessions: Mutex<HashMap<String, Session>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, user: &str) -> bool {
        self.sessions.lock().contains_key(user)
    }

    pub fn active_sport(&self, user: &str) -> Option<Sport> {
        self.sessions.lock().get(user).map(|session| session.sport)
    }

    /// Field the next message from `user` will answer.
    pub fn next_fact(&self, user: &str) -> Option<String> {
        self.sessions
            .lock()
            .get(user)
            .and_then(|session| session.next_fact.clone())
    }

    /// Number of answers recorded for `user`, including rejected ones.
    pub fn history_len(&self, user: &str) -> usize {
        self.sessions
            .lock()
            .get(user)
            .map_or(0, |session| session.history.len())
    }

    /// Reply to one chat message from `user`.
    pub fn handle(&self, user: &str, text: &str, registry: &AdviserRegistry) -> String {
        let text = text.trim().to_lowercase();

        if text == "/start" {
            return GREETING.to_string();
        }
        if RESET_KEYWORDS.contains(&text.as_str()) {
            self.sessions.lock().remove(user);
            return RESET_MESSAGE.to_string();
        }

        // Held only to snapshot and store the session, never across the turn.
        let existing = self.sessions.lock().get(user).cloned();
        let mut session = match existing {
            Some(mut session) => {
                if let Some(field) = session.next_fact.as_deref() {
                    session.history.push(Answer::new(field, text.as_str()));
                }
                session
            }
            None => {
                let Some(sport) = Sport::detect(&text) else {
                    return CHOOSE_SPORT.to_string();
                };
                Session {
                    sport,
                    history: Vec::new(),
                    next_fact: None,
                }
            }
        };

        let reply = Self::advance(user, &mut session, registry);
        let mut sessions = self.sessions.lock();
        if session.next_fact.is_some() {
            sessions.insert(user.to_string(), session);
        } else {
            sessions.remove(user);
        }
        reply
    }

    fn advance(user: &str, session: &mut Session, registry: &AdviserRegistry) -> String {
        match registry.turn(session.sport, &session.history) {
            Ok(turn) => {
                session.next_fact = turn.next_fact().map(str::to_string);
                turn.message().to_string()
            }
            Err(err) => {
                session.next_fact = None;
                event!(
                    target: "sport_advisor::chat",
                    Level::ERROR,
                    user,
                    sport = session.sport.as_str(),
                    error = %err,
                );
                FALLBACK_MESSAGE.to_string()
            }
        }
    }
}

/// Reads one message per line until EOF or an exit keyword, writing each reply.
pub fn run_repl<R, W>(
    sessions: &ChatSessions,
    registry: &AdviserRegistry,
    user: &str,
    input: R,
    mut output: W,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{GREETING}")?;
    let mut handled = 0usize;
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if EXIT_KEYWORDS.contains(&trimmed.to_lowercase().as_str()) {
            break;
        }
        let reply = sessions.handle(user, trimmed, registry);
        writeln!(output, "{reply}")?;
        output.flush()?;
        handled += 1;
    }
    Ok(handled)
}
