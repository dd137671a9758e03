//! Directory-backed bot library.
//!
//! A bot named `kiter` is the file `kiter.rhai` in the library directory.
//! Its evolved form, if any, is `kiter.evolved.rhai`; the leading `//`
//! comment block of that file is used as the evolution narrative. An
//! optional `kiter.style.json` supplies the cosmetic style descriptor.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde_json::json;
use skirmish_core::author::{AuthorError, BotAuthor, Evolution, EvolutionRequest, GeneratedBot};
use skirmish_core::config::BotEntry;
use tracing::{debug, info};

/// Extension of decision-logic files.
const SOURCE_EXT: &str = "rhai";

/// Infix marking an evolved variant.
const EVOLVED_INFIX: &str = "evolved";

/// Bots loaded from a directory of scripts.
#[derive(Debug, Clone)]
pub struct BotLibrary {
    dir: PathBuf,
}

impl BotLibrary {
    /// A library rooted at `dir`.
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The library directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a configured bot: an explicit script path wins over the
    /// library lookup. Relative script paths resolve against `base`.
    pub async fn load(&self, entry: &BotEntry, base: &Path) -> Result<GeneratedBot, AuthorError> {
        match &entry.script {
            Some(script) => {
                let path = base.join(script);
                debug!(bot = %entry.name, path = %path.display(), "loading explicit script");
                let source = read_source(&path, &entry.name).await?;
                Ok(GeneratedBot {
                    name: entry.name.clone(),
                    source,
                    style: self.style(&entry.name).await,
                })
            }
            None => self.create(&entry.name).await,
        }
    }

    fn path(&self, name: &str, evolved: bool) -> Result<PathBuf, AuthorError> {
        if !is_valid_name(name) {
            return Err(AuthorError::NotFound {
                name: name.to_owned(),
            });
        }
        let file = if evolved {
            format!("{name}.{EVOLVED_INFIX}.{SOURCE_EXT}")
        } else {
            format!("{name}.{SOURCE_EXT}")
        };
        Ok(self.dir.join(file))
    }

    async fn style(&self, name: &str) -> serde_json::Value {
        let fallback = json!({ "name": name });
        if !is_valid_name(name) {
            return fallback;
        }
        let path = self.dir.join(format!("{name}.style.json"));
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                debug!(bot = name, error = %err, "ignoring unreadable style descriptor");
                fallback
            }),
            Err(_missing) => fallback,
        }
    }
}

/// Bot names are plain file stems: ASCII letters, digits, `-` and `_`.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn read_source(path: &Path, name: &str) -> Result<String, AuthorError> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            AuthorError::NotFound {
                name: name.to_owned(),
            }
        } else {
            AuthorError::Io { source: err }
        }
    })
}

/// The leading `//` comment block, joined into one line.
fn narrative_of(source: &str) -> Option<String> {
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .skip_while(|l| l.is_empty())
        .map_while(|l| l.strip_prefix("//"))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join(" "))
}

impl BotAuthor for BotLibrary {
    fn create<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<GeneratedBot, AuthorError>> {
        Box::pin(async move {
            let path = self.path(name, false)?;
            let source = read_source(&path, name).await?;
            info!(bot = name, bytes = source.len(), "bot loaded from library");
            Ok(GeneratedBot {
                name: name.to_owned(),
                source,
                style: self.style(name).await,
            })
        })
    }

    fn evolve<'a>(
        &'a self,
        request: &'a EvolutionRequest,
    ) -> BoxFuture<'a, Result<Evolution, AuthorError>> {
        Box::pin(async move {
            let path = self.path(&request.bot, true)?;
            let source = read_source(&path, &request.bot).await.map_err(|err| match err {
                AuthorError::NotFound { name } => AuthorError::NoEvolution { name },
                other => other,
            })?;
            let narrative = narrative_of(&source)
                .unwrap_or_else(|| format!("{} switches to its evolved playbook", request.bot));
            info!(
                match_id = %request.match_id,
                agent = %request.agent,
                bot = %request.bot,
                instruction = %request.instruction,
                "evolved source loaded"
            );
            Ok(Evolution { source, narrative })
        })
    }
}
