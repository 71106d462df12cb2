//! Session - Identità esplicita passata a ogni componente che ne ha bisogno
//!
//! Sostituisce il contesto globale "utente corrente": il middleware di autenticazione
//! costruisce una `Session` per ogni richiesta e la inserisce nelle Extension.

use crate::core::MessagingError;
use crate::entities::User;

#[derive(Debug, Clone)]
pub enum Identity {
    /// Nessun utente loggato
    Guest,
    User(User),
}

#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
}

impl Session {
    pub fn guest() -> Self {
        Self {
            identity: Identity::Guest,
        }
    }

    pub fn for_user(user: User) -> Self {
        Self {
            identity: Identity::User(user),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_guest(&self) -> bool {
        matches!(self.identity, Identity::Guest)
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.identity {
            Identity::Guest => None,
            Identity::User(user) => Some(&user.user_id),
        }
    }

    /// Utente autenticato oppure `NotAuthenticated`
    pub fn require_user(&self) -> Result<&User, MessagingError> {
        match &self.identity {
            Identity::Guest => Err(MessagingError::NotAuthenticated),
            Identity::User(user) => Ok(user),
        }
    }

    /// Utente con ruolo Admin oppure `PermissionDenied`
    pub fn require_admin(&self) -> Result<&User, MessagingError> {
        let user = self.require_user()?;
        if !user.is_admin() {
            return Err(MessagingError::PermissionDenied("admin role required"));
        }
        Ok(user)
    }
}
