use std::sync::Arc;

use crate::domain::types::HashingPolicy;
use crate::infra::graph::ArangoGraphCascade;
use crate::infra::repository::Repository;
use crate::usecase::rehash::RehashSupervisor;
use crate::usecase::session::SessionsInteractor;
use crate::usecase::user::{
    CreateUsersUseCase, DeleteUsersUseCase, FindUserByCredUseCase, FindUsersUseCase,
    SigninUseCase, SignoutUseCase, UpdatePasswordUseCase, UpdateUsersUseCase,
};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub rehash: Arc<RehashSupervisor>,
    pub hashing: HashingPolicy,
    pub policy_name: String,
    pub auth_server_url: String,
    pub edge_collections: Vec<String>,
}

impl AppState {
    pub fn sessions(&self) -> SessionsInteractor<Repository> {
        SessionsInteractor {
            sender: self.repo.clone(),
            auth_server_url: self.auth_server_url.clone(),
        }
    }

    pub fn graph_cascade(&self) -> ArangoGraphCascade<Repository> {
        ArangoGraphCascade {
            runner: self.repo.clone(),
            edge_collections: self.edge_collections.clone(),
        }
    }

    pub fn find_users(&self) -> FindUsersUseCase<Repository> {
        FindUsersUseCase {
            runner: self.repo.clone(),
        }
    }

    pub fn create_users(&self) -> CreateUsersUseCase<Repository> {
        CreateUsersUseCase {
            runner: self.repo.clone(),
            rehash: self.rehash.clone(),
            hashing: self.hashing,
        }
    }

    pub fn update_users(&self) -> UpdateUsersUseCase<Repository> {
        UpdateUsersUseCase {
            runner: self.repo.clone(),
        }
    }

    pub fn update_password(&self) -> UpdatePasswordUseCase<Repository> {
        UpdatePasswordUseCase {
            runner: self.repo.clone(),
            hashing: self.hashing,
        }
    }

    pub fn delete_users(
        &self,
    ) -> DeleteUsersUseCase<Repository, ArangoGraphCascade<Repository>, SessionsInteractor<Repository>>
    {
        DeleteUsersUseCase {
            runner: self.repo.clone(),
            graph: self.graph_cascade(),
            sessions: self.sessions(),
        }
    }

    pub fn signin(&self) -> SigninUseCase<Repository, SessionsInteractor<Repository>> {
        SigninUseCase {
            find: FindUserByCredUseCase {
                runner: self.repo.clone(),
            },
            sessions: self.sessions(),
            policy_name: self.policy_name.clone(),
        }
    }

    pub fn signout(&self) -> SignoutUseCase<SessionsInteractor<Repository>> {
        SignoutUseCase {
            sessions: self.sessions(),
        }
    }
}
