use std::sync::Arc;

use serde_json::json;

use versatile_domain::filter::Filter;
use versatile_domain::session::Session;
use versatile_domain::user::{AuthServerPayload, Credentials, User};

use crate::domain::query::{Query, filter_to_aql};
use crate::domain::repository::{GraphCascadeDeleter, QueryRunner, SessionStore};
use crate::domain::types::{Caller, HashingPolicy, OWNER_TOKEN_LEN, USERS_COLLECTION};
use crate::error::ServerError;
use crate::usecase::password::{generate_token, hash_password, verify_password};
use crate::usecase::rehash::{PendingRehash, RehashSupervisor};

/// Which records a caller may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Records the caller created, plus its own.
    Visible,
    /// Records the caller created.
    CreatedBy,
    /// Only the caller's own record.
    Own,
}

impl Scope {
    fn clause(self) -> &'static str {
        match self {
            Scope::Visible => "FILTER u.createdBy == @userID || u._id == @userID\n",
            Scope::CreatedBy => "FILTER u.createdBy == @userID\n",
            Scope::Own => "FILTER u._id == @userID\n",
        }
    }
}

/// `FOR u IN users` narrowed by scope and filter, ending in `action`.
fn scoped_query(
    scope: Scope,
    caller_id: &str,
    filter: &Filter,
    action: &str,
) -> Result<Query, ServerError> {
    let clauses = filter_to_aql("u", filter)?;
    let aql = format!(
        "FOR u IN {USERS_COLLECTION}\n{}{}{action}",
        scope.clause(),
        clauses.text
    );
    Ok(Query::new(aql)
        .bind("userID", caller_id)
        .bind_all(clauses.bind_vars))
}

fn update_query(caller_id: &str, filter: &Filter, patch: &User) -> Result<Query, ServerError> {
    let action = format!("UPDATE u WITH @user IN {USERS_COLLECTION}\nRETURN NEW");
    Ok(scoped_query(Scope::Visible, caller_id, filter, &action)?.bind("user", json!(patch)))
}

fn first_or_not_found(users: Vec<User>) -> Result<User, ServerError> {
    users.into_iter().next().ok_or(ServerError::NotFound)
}

// ── FindUsers ────────────────────────────────────────────────────────────────

pub struct FindUsersUseCase<Q: QueryRunner> {
    pub runner: Q,
}

impl<Q: QueryRunner> FindUsersUseCase<Q> {
    pub async fn execute(&self, caller: &Caller, filter: &Filter) -> Result<Vec<User>, ServerError> {
        let query = scoped_query(Scope::Visible, &caller.id, filter, "RETURN u")?;
        self.runner.run(&query).await
    }

    /// Single record by `_id`, still subject to visibility.
    pub async fn execute_by_key(
        &self,
        caller: &Caller,
        id: &str,
        filter: Filter,
    ) -> Result<User, ServerError> {
        let filter = filter.and_equals("_id", id);
        first_or_not_found(self.execute(caller, &filter).await?)
    }
}

// ── FindUserByCred ───────────────────────────────────────────────────────────

pub struct FindUserByCredUseCase<Q: QueryRunner> {
    pub runner: Q,
}

impl<Q: QueryRunner> FindUserByCredUseCase<Q> {
    /// Unknown email and wrong password both yield `NotFound`.
    pub async fn execute(&self, credentials: &Credentials) -> Result<User, ServerError> {
        let query = Query::new(format!(
            "FOR u IN {USERS_COLLECTION}\nFILTER u.email == @email\nRETURN u"
        ))
        .bind("email", credentials.email.as_str());
        let users: Vec<User> = self.runner.run(&query).await?;
        if users.len() > 1 {
            tracing::warn!(matches = users.len(), "email shared by several users, using the first");
        }
        let user = first_or_not_found(users)?;
        if !verify_password(credentials.password.clone(), user.password.clone()).await {
            return Err(ServerError::NotFound);
        }
        Ok(user)
    }
}

// ── CreateUsers ──────────────────────────────────────────────────────────────

pub struct CreateUsersUseCase<Q: QueryRunner> {
    pub runner: Q,
    pub rehash: Arc<RehashSupervisor>,
    pub hashing: HashingPolicy,
}

impl<Q: QueryRunner + Clone + 'static> CreateUsersUseCase<Q> {
    /// Users carrying a `_key` take the seed path: a cheap placeholder hash now,
    /// the full-cost hash later from the background rehash task.
    pub async fn execute(&self, caller: &Caller, users: Vec<User>) -> Result<Vec<User>, ServerError> {
        let mut pending = Vec::new();
        let mut prepared = Vec::with_capacity(users.len());

        for mut user in users {
            let plain = std::mem::take(&mut user.password);
            if user.key.is_empty() {
                user.password = hash_password(plain, self.hashing.interactive_cost).await?;
            } else {
                user.password = hash_password(plain.clone(), self.hashing.seed_cost).await?;
                pending.push(PendingRehash {
                    key: user.key.clone(),
                    password: plain,
                });
            }
            user.owner_token = generate_token(OWNER_TOKEN_LEN);
            user.created_by = caller.id.clone();
            prepared.push(user);
        }

        let query = Query::new(format!(
            "FOR u IN @users\nINSERT u IN {USERS_COLLECTION}\nRETURN NEW"
        ))
        .bind("users", json!(prepared));
        let created: Vec<User> = self.runner.run(&query).await?;

        tracing::info!(created = created.len(), pending_rehash = pending.len(), "users created");
        self.rehash.restart(self.runner.clone(), pending).await;
        Ok(created)
    }

    pub async fn execute_one(&self, caller: &Caller, user: User) -> Result<User, ServerError> {
        first_or_not_found(self.execute(caller, vec![user]).await?)
    }
}

// ── UpdateUsers ──────────────────────────────────────────────────────────────

pub struct UpdateUsersUseCase<Q: QueryRunner> {
    pub runner: Q,
}

impl<Q: QueryRunner> UpdateUsersUseCase<Q> {
    /// Applies the partial record `patch` to every visible match.
    pub async fn execute(
        &self,
        caller: &Caller,
        patch: &User,
        filter: &Filter,
    ) -> Result<Vec<User>, ServerError> {
        let query = update_query(&caller.id, filter, patch)?;
        self.runner.run(&query).await
    }

    pub async fn execute_by_key(
        &self,
        caller: &Caller,
        id: &str,
        patch: &User,
    ) -> Result<User, ServerError> {
        let filter = Filter::default().and_equals("_id", id);
        first_or_not_found(self.execute(caller, patch, &filter).await?)
    }
}

// ── UpdatePassword ───────────────────────────────────────────────────────────

pub struct UpdatePasswordUseCase<Q: QueryRunner> {
    pub runner: Q,
    pub hashing: HashingPolicy,
}

impl<Q: QueryRunner> UpdatePasswordUseCase<Q> {
    pub async fn execute(
        &self,
        caller: &Caller,
        id: &str,
        plain: String,
    ) -> Result<User, ServerError> {
        let patch = User {
            password: hash_password(plain, self.hashing.full_cost).await?,
            ..Default::default()
        };
        let filter = Filter::default().and_equals("_id", id);
        let query = update_query(&caller.id, &filter, &patch)?;
        first_or_not_found(self.runner.run(&query).await?)
    }
}

// ── DeleteUsers ──────────────────────────────────────────────────────────────

pub struct DeleteUsersUseCase<Q: QueryRunner, G: GraphCascadeDeleter, S: SessionStore> {
    pub runner: Q,
    pub graph: G,
    pub sessions: S,
}

impl<Q, G, S> DeleteUsersUseCase<Q, G, S>
where
    Q: QueryRunner,
    G: GraphCascadeDeleter,
    S: SessionStore,
{
    /// Removes matching records the caller created, then runs the graph and
    /// session cascades concurrently. The removal stands even when a cascade
    /// fails.
    pub async fn execute(&self, caller: &Caller, filter: &Filter) -> Result<Vec<User>, ServerError> {
        self.remove(Scope::CreatedBy, caller, filter).await
    }

    pub async fn execute_by_key(&self, caller: &Caller, id: &str) -> Result<User, ServerError> {
        let filter = Filter::default().and_equals("_id", id);
        first_or_not_found(self.execute(caller, &filter).await?)
    }

    /// Removes the caller's own record.
    pub async fn execute_self(&self, caller: &Caller) -> Result<User, ServerError> {
        first_or_not_found(self.remove(Scope::Own, caller, &Filter::default()).await?)
    }

    async fn remove(
        &self,
        scope: Scope,
        caller: &Caller,
        filter: &Filter,
    ) -> Result<Vec<User>, ServerError> {
        let query = scoped_query(
            scope,
            &caller.id,
            filter,
            &format!("REMOVE u IN {USERS_COLLECTION}\nRETURN OLD"),
        )?;
        let removed: Vec<User> = self.runner.run(&query).await?;
        if removed.is_empty() {
            return Ok(removed);
        }

        let (graph, sessions) = tokio::join!(
            self.graph.delete_cascade(&removed),
            self.sessions.delete_cascade(caller, &removed),
        );
        if let Err(e) = &graph {
            tracing::error!(error = %e, users = removed.len(), "graph cascade failed");
        }
        if let Err(e) = &sessions {
            tracing::error!(error = %e, users = removed.len(), "session cascade failed");
        }
        graph?;
        sessions?;
        Ok(removed)
    }
}

// ── Signin ───────────────────────────────────────────────────────────────────

pub struct SigninUseCase<Q: QueryRunner, S: SessionStore> {
    pub find: FindUserByCredUseCase<Q>,
    pub sessions: S,
    pub policy_name: String,
}

impl<Q: QueryRunner, S: SessionStore> SigninUseCase<Q, S> {
    pub async fn execute(&self, credentials: &Credentials, agent: &str) -> Result<Session, ServerError> {
        let user = self.find.execute(credentials).await?.redacted();
        let role = user.role;
        let payload = serde_json::to_string(&AuthServerPayload {
            user: Some(user.clone()),
            role,
        })
        .map_err(anyhow::Error::from)?;

        let session = Session {
            owner_token: user.owner_token,
            agent: agent.to_owned(),
            policies: vec![self.policy_name.clone()],
            payload,
            role,
            ..Default::default()
        };
        let created = self.sessions.create(&Caller::anonymous(), &session).await?;
        tracing::info!(user = %user.id, "signed in");
        Ok(created)
    }
}

// ── Signout ──────────────────────────────────────────────────────────────────

pub struct SignoutUseCase<S: SessionStore> {
    pub sessions: S,
}

impl<S: SessionStore> SignoutUseCase<S> {
    pub async fn execute(&self, caller: &Caller, token: &str) -> Result<Session, ServerError> {
        self.sessions.delete(caller, token).await
    }
}
