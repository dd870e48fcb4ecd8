use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Follow,
    Like,
    Repost,
    Comment,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::Follow,
            ActionKind::Like,
            ActionKind::Repost,
            ActionKind::Comment,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Follow => "follow",
            ActionKind::Like => "like",
            ActionKind::Repost => "repost",
            ActionKind::Comment => "comment",
        }
    }

    /// API path for this check.
    pub fn endpoint(self) -> &'static str {
        match self {
            ActionKind::Follow => "/api/check/follow",
            ActionKind::Like => "/api/check/like",
            ActionKind::Repost => "/api/check/repost",
            ActionKind::Comment => "/api/check/comment",
        }
    }

    /// Field of the `result` object that says whether the action was done.
    pub fn completion_field(self) -> &'static str {
        match self {
            ActionKind::Follow => "is_following",
            ActionKind::Like => "is_liked",
            ActionKind::Repost => "is_reposted",
            ActionKind::Comment => "has_commented",
        }
    }

    /// Read the completion flag out of a check result. `None` if the field is
    /// missing or not a boolean.
    pub fn completion_from(self, result: &Value) -> Option<bool> {
        result.get(self.completion_field()).and_then(Value::as_bool)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = crate::error::XcheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(ActionKind::Follow),
            "like" => Ok(ActionKind::Like),
            "repost" => Ok(ActionKind::Repost),
            "comment" => Ok(ActionKind::Comment),
            _ => Err(crate::error::XcheckError::InvalidActionKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

/// One verification to run. The variant fixes which parameters are present.
///
/// Deserializes from `{"type": "follow", "target_user": "@someone"}` and
/// friends; an unknown `type` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRequest {
    Follow {
        target_user: String,
    },
    Like {
        tweet_url: String,
    },
    Repost {
        tweet_url: String,
    },
    Comment {
        tweet_url: String,
        checking_user: String,
    },
}

impl ActionRequest {
    pub fn follow(target_user: impl Into<String>) -> Self {
        ActionRequest::Follow {
            target_user: target_user.into(),
        }
    }

    pub fn like(tweet_url: impl Into<String>) -> Self {
        ActionRequest::Like {
            tweet_url: tweet_url.into(),
        }
    }

    pub fn repost(tweet_url: impl Into<String>) -> Self {
        ActionRequest::Repost {
            tweet_url: tweet_url.into(),
        }
    }

    pub fn comment(tweet_url: impl Into<String>, checking_user: impl Into<String>) -> Self {
        ActionRequest::Comment {
            tweet_url: tweet_url.into(),
            checking_user: checking_user.into(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Follow { .. } => ActionKind::Follow,
            ActionRequest::Like { .. } => ActionKind::Like,
            ActionRequest::Repost { .. } => ActionKind::Repost,
            ActionRequest::Comment { .. } => ActionKind::Comment,
        }
    }

    /// JSON body posted to the check endpoint.
    pub fn body(&self) -> Value {
        match self {
            ActionRequest::Follow { target_user } => json!({ "target_user": target_user }),
            ActionRequest::Like { tweet_url } | ActionRequest::Repost { tweet_url } => {
                json!({ "tweet_url": tweet_url })
            }
            ActionRequest::Comment {
                tweet_url,
                checking_user,
            } => json!({ "tweet_url": tweet_url, "checking_user": checking_user }),
        }
    }
}
