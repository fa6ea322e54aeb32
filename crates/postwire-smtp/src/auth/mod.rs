//! EHLO / STARTTLS / AUTH negotiation.
//!
//! Capability detection follows the reply text: a server is considered to
//! offer STARTTLS, AUTH, LOGIN or PLAIN when any EHLO reply line contains the
//! token (case-sensitive).

use crate::command::Command;
use crate::config::Config;
use crate::connection::{Protocol, Transport};
use crate::error::{Error, Result};
use crate::types::{AuthMechanism, ReplyCode, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

/// EHLO rounds allowed: the plaintext greeting plus one after STARTTLS.
const MAX_EHLO_ROUNDS: usize = 2;

/// Runs the negotiation on a connected session.
///
/// Returns `Ok(true)` when the session may send mail: credentials were
/// accepted, or the server advertised no AUTH capability at all. Returns
/// `Ok(false)` when a step of the LOGIN/PLAIN exchange was answered with an
/// unexpected code, or when AUTH is offered without a supported mechanism.
///
/// # Errors
///
/// Returns an error on transport failure, on a failed TLS handshake, and
/// with [`Error::StartTlsRepeated`] if the server still offers STARTTLS once
/// the connection is encrypted.
pub async fn negotiate<T: Transport>(protocol: &mut Protocol<T>, config: &Config) -> Result<bool> {
    let capabilities = negotiate_tls(protocol, config).await?;

    if capabilities.contains_text("AUTH") {
        if capabilities.contains_text("LOGIN") {
            return login(protocol, &config.username, &config.password).await;
        }
        if capabilities.contains_text("PLAIN") {
            return plain(protocol, &config.username, &config.password).await;
        }
        warn!("Server offers no supported AUTH mechanism");
        return Ok(false);
    }

    debug!("Server advertises no AUTH, continuing without credentials");
    protocol.send(&ehlo(config)).await?;
    Ok(true)
}

/// Sends EHLO, upgrading to TLS whenever STARTTLS is offered and accepted.
///
/// Returns the EHLO reply the AUTH decision is based on.
async fn negotiate_tls<T: Transport>(protocol: &mut Protocol<T>, config: &Config) -> Result<Response> {
    for _ in 0..MAX_EHLO_ROUNDS {
        let capabilities = protocol.send(&ehlo(config)).await?;
        if !capabilities.contains_text("STARTTLS") {
            return Ok(capabilities);
        }
        if protocol.transport().is_tls() {
            return Err(Error::StartTlsRepeated);
        }

        let reply = protocol.send(&Command::StartTls).await?;
        if !reply.contains_status(ReplyCode::SERVICE_READY) {
            let temporary = reply.contains_status(ReplyCode::TLS_UNAVAILABLE);
            warn!(code = ?reply.code(), temporary, "STARTTLS refused, staying on plaintext");
            return Ok(capabilities);
        }

        protocol.upgrade_to_tls(&config.host).await?;
        info!(host = %config.host, "Connection upgraded to TLS");
    }

    Err(Error::StartTlsRepeated)
}

/// AUTH LOGIN: username and password in two base64 challenge answers.
async fn login<T: Transport>(protocol: &mut Protocol<T>, username: &str, password: &str) -> Result<bool> {
    let reply = protocol
        .send(&Command::Auth {
            mechanism: AuthMechanism::Login,
        })
        .await?;
    if !reply.contains_status(ReplyCode::AUTH_CONTINUE) {
        return Ok(rejected(AuthMechanism::Login, "AUTH", &reply));
    }

    let reply = protocol.send(&encoded(username.as_bytes())).await?;
    if !reply.contains_status(ReplyCode::AUTH_CONTINUE) {
        return Ok(rejected(AuthMechanism::Login, "username", &reply));
    }

    let reply = protocol.send(&encoded(password.as_bytes())).await?;
    if !reply.contains_status(ReplyCode::AUTH_SUCCESSFUL) {
        return Ok(rejected(AuthMechanism::Login, "password", &reply));
    }

    info!(mechanism = %AuthMechanism::Login, "Authenticated");
    Ok(true)
}

/// AUTH PLAIN: `username\0username\0password` in one base64 answer.
async fn plain<T: Transport>(protocol: &mut Protocol<T>, username: &str, password: &str) -> Result<bool> {
    let reply = protocol
        .send(&Command::Auth {
            mechanism: AuthMechanism::Plain,
        })
        .await?;
    if !reply.contains_status(ReplyCode::AUTH_CONTINUE) {
        return Ok(rejected(AuthMechanism::Plain, "AUTH", &reply));
    }

    let credentials = format!("{username}\0{username}\0{password}");
    let reply = protocol.send(&encoded(credentials.as_bytes())).await?;
    if !reply.contains_status(ReplyCode::AUTH_SUCCESSFUL) {
        return Ok(rejected(AuthMechanism::Plain, "credentials", &reply));
    }

    info!(mechanism = %AuthMechanism::Plain, "Authenticated");
    Ok(true)
}

fn ehlo(config: &Config) -> Command {
    Command::Ehlo {
        domain: config.ehlo_domain().to_string(),
    }
}

fn encoded(data: &[u8]) -> Command {
    Command::AuthResponse(STANDARD.encode(data))
}

fn rejected(mechanism: AuthMechanism, step: &str, reply: &Response) -> bool {
    if reply.contains_status(ReplyCode::AUTH_FAILED) {
        warn!(%mechanism, step, text = %reply.text(), "Credentials rejected");
    } else {
        warn!(%mechanism, step, code = ?reply.code(), text = %reply.text(), "Authentication rejected");
    }
    false
}
