use std::{convert::Infallible, sync::Arc};

use chrono::Utc;
use log::error;
use serde::Deserialize;
use warp::{
    http::{header, Response, StatusCode},
    hyper::{body::Bytes, Body},
    reject, Filter, Rejection, Reply,
};

use crate::{
    error::FrameError,
    frame::FrameResponder,
    svg::{render_error, render_overview},
};

const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct FrameQuery {
    pub state: Option<String>,
}

fn with_responder(
    responder: Arc<FrameResponder>,
) -> impl Filter<Extract = (Arc<FrameResponder>,), Error = Infallible> + Clone {
    warp::any().map(move || responder.clone())
}

/// `GET|POST /frame`, `GET|OPTIONS /image`.
pub fn routes(
    responder: Arc<FrameResponder>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let frame_get = warp::path!("frame")
        .and(warp::get())
        .and(with_responder(responder.clone()))
        .and_then(frame_initial);
    let unreadable = responder.clone();
    let frame_post = warp::path!("frame").and(warp::post()).and(
        warp::query::<FrameQuery>()
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::bytes())
            .and(with_responder(responder.clone()))
            .and_then(frame_action)
            .recover(move |rejection: Rejection| {
                unreadable_action(rejection, unreadable.clone())
            }),
    );
    let image_get = warp::path!("image")
        .and(warp::get())
        .and(with_responder(responder))
        .and_then(image_svg);
    let preflight = warp::path!("image")
        .and(warp::options())
        .map(|| image_response(StatusCode::NO_CONTENT, String::new()));

    frame_get
        .or(frame_post)
        .or(image_get)
        .or(preflight)
        .with(warp::log("pageframes"))
}

async fn frame_initial(responder: Arc<FrameResponder>) -> Result<impl Reply, Infallible> {
    Ok(warp::reply::html(responder.initial().render()))
}

async fn frame_action(
    query: FrameQuery,
    body: Bytes,
    responder: Arc<FrameResponder>,
) -> Result<impl Reply, Infallible> {
    let frame = responder.respond(query.state.as_deref(), &body).await;
    Ok(warp::reply::html(frame.render()))
}

/// Post-backs warp refuses to read still get a frame: no body is the initial
/// card, an oversized body or bad query string is the error card.
async fn unreadable_action(
    rejection: Rejection,
    responder: Arc<FrameResponder>,
) -> Result<impl Reply, Rejection> {
    let frame = if rejection.find::<reject::LengthRequired>().is_some() {
        responder.initial()
    } else if rejection.find::<reject::PayloadTooLarge>().is_some() {
        let error = FrameError::malformed(format!(
            "frame action body exceeds {} bytes",
            MAX_BODY_BYTES
        ));
        error!("Frame request failed: {}", error);
        responder.error(&error)
    } else if rejection.find::<reject::InvalidQuery>().is_some() {
        let error = FrameError::malformed("frame query string");
        error!("Frame request failed: {}", error);
        responder.error(&error)
    } else {
        return Err(rejection);
    };
    Ok(warp::reply::html(frame.render()))
}

async fn image_svg(responder: Arc<FrameResponder>) -> Result<impl Reply, Infallible> {
    let response = match responder.valuation().await {
        Ok(valuation) => image_response(StatusCode::OK, render_overview(&valuation, Utc::now())),
        Err(err) => {
            error!("Image request failed: {}", err);
            image_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                render_error(&err.to_string()),
            )
        }
    };
    Ok(response)
}

/// SVG with permissive CORS, never cached.
fn image_response(status: StatusCode, svg: String) -> Response<Body> {
    let mut response = Response::new(Body::from(svg));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("image/svg+xml"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static("*"),
    );
    response
}
