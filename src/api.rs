use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::chain::verify_chain;
use crate::error::LedgerError;
use crate::hashing::voter_digest;
use crate::ledger::VoteLedger;
use crate::models::CandidateCount;
use crate::store::LedgerStore;

/// Shared between workers. The mutex is the only path to the ledger, so
/// at most one ballot is applied at a time.
pub struct AppState<S> {
    pub ledger: Mutex<VoteLedger<S>>,
}

impl<S> AppState<S> {
    pub fn new(ledger: VoteLedger<S>) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Ballot {
    #[serde(default)]
    pub voter_id: String,
    pub candidate: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TallyResponse {
    pub height: usize,
    pub tally: Vec<CandidateCount>,
}

fn error_response(err: &LedgerError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        LedgerError::DuplicateVote => HttpResponse::Conflict().json(body),
        LedgerError::MissingIdentifier | LedgerError::UnknownCandidate(_) => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn handle_vote<S: LedgerStore>(
    data: web::Data<AppState<S>>,
    ballot: web::Json<Ballot>,
) -> impl Responder {
    let ballot = ballot.into_inner();
    if ballot.voter_id.trim().is_empty() {
        return error_response(&LedgerError::MissingIdentifier);
    }

    let mut ledger = data.ledger.lock().await;
    match ledger.cast_vote(&ballot.voter_id, &ballot.candidate) {
        Ok(block) => HttpResponse::Ok().json(block),
        Err(err) => {
            if !err.is_rejection() {
                log::error!("failed to record vote: {}", err);
            }
            error_response(&err)
        }
    }
}

async fn get_tally<S: LedgerStore>(data: web::Data<AppState<S>>) -> impl Responder {
    let ledger = data.ledger.lock().await;
    HttpResponse::Ok().json(TallyResponse {
        height: ledger.height(),
        tally: ledger.tally_view(),
    })
}

async fn get_chain<S: LedgerStore>(data: web::Data<AppState<S>>) -> impl Responder {
    let ledger = data.ledger.lock().await;
    HttpResponse::Ok().json(ledger.chain())
}

async fn has_voted<S: LedgerStore>(
    data: web::Data<AppState<S>>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let voter_id = match query.get("voter_id") {
        Some(id) if !id.trim().is_empty() => id,
        _ => return error_response(&LedgerError::MissingIdentifier),
    };

    let digest = voter_digest(voter_id);
    let ledger = data.ledger.lock().await;
    HttpResponse::Ok().json(json!({ "voted": ledger.has_voted(&digest) }))
}

async fn get_candidates<S: LedgerStore>(data: web::Data<AppState<S>>) -> impl Responder {
    let ledger = data.ledger.lock().await;
    HttpResponse::Ok().json(ledger.candidates())
}

async fn verify<S: LedgerStore>(data: web::Data<AppState<S>>) -> impl Responder {
    let ledger = data.ledger.lock().await;
    match verify_chain(ledger.chain()) {
        Ok(()) => HttpResponse::Ok().json(json!({ "valid": true, "height": ledger.height() })),
        Err(fault) => {
            log::warn!("in-memory chain failed verification: {}", fault);
            HttpResponse::Ok().json(json!({ "valid": false, "fault": fault.to_string() }))
        }
    }
}

/// Registers every ledger route. The caller supplies `web::Data<AppState<S>>`.
pub fn configure<S: LedgerStore + Send + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/vote", web::post().to(handle_vote::<S>))
        .route("/getTally", web::get().to(get_tally::<S>))
        .route("/getChain", web::get().to(get_chain::<S>))
        .route("/hasVoted", web::get().to(has_voted::<S>))
        .route("/candidates", web::get().to(get_candidates::<S>))
        .route("/verify", web::get().to(verify::<S>));
}
