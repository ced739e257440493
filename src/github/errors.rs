use octocrab::Error as OctocrabError;

#[derive(Debug)]
pub enum GitHubError {
    TokenNotFound(String),
    ApiError(OctocrabError),
    NetworkError(String),
    InvalidResponse(String),
}

impl GitHubError {
    /// HTTP status reported by GitHub, when the failure came from the API
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GitHubError::ApiError(OctocrabError::GitHub { source, .. }) => {
                Some(source.status_code.as_u16())
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<OctocrabError> for GitHubError {
    fn from(err: OctocrabError) -> Self {
        GitHubError::ApiError(err)
    }
}

impl std::fmt::Display for GitHubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHubError::TokenNotFound(msg) => {
                writeln!(f, "GitHub authentication error: {msg}")?;
                write!(
                    f,
                    "   → Set CHERRY_BOT_GITHUB__TOKEN or GITHUB_TOKEN to a token with 'repo' and 'read:org' scopes"
                )
            }
            GitHubError::ApiError(octocrab_err) => match octocrab_err {
                OctocrabError::GitHub { source, .. } => {
                    write!(f, "GitHub API error: HTTP {}: {}", source.status_code, source.message)?;
                    match source.status_code.as_u16() {
                        401 => write!(f, " (token is invalid or expired)"),
                        403 => write!(f, " (token lacks permission or rate limit exhausted)"),
                        404 => write!(f, " (resource not found or not visible to the bot)"),
                        422 => write!(f, " (request rejected by validation)"),
                        _ => Ok(()),
                    }
                }
                OctocrabError::Http { .. } => {
                    write!(f, "GitHub API error: network connection to api.github.com failed")
                }
                _ => write!(f, "GitHub API error: {octocrab_err}"),
            },
            GitHubError::NetworkError(msg) => write!(f, "GitHub network error: {msg}"),
            GitHubError::InvalidResponse(msg) => write!(f, "Unexpected GitHub response: {msg}"),
        }
    }
}

impl std::error::Error for GitHubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitHubError::ApiError(err) => Some(err),
            _ => None,
        }
    }
}
