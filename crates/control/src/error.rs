// Copyright 2026 The Gough Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Maps `Classified` onto the `{error, message}` HTTP body of §6/§7.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use gough_core::{Classified, ErrorBody};

pub fn status_for(e: &Classified) -> StatusCode {
    match e {
        Classified::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        Classified::Conflict(_) => StatusCode::CONFLICT,
        Classified::Invalid(_) => StatusCode::BAD_REQUEST,
        Classified::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        Classified::Forbidden(_) => StatusCode::FORBIDDEN,
        Classified::NotFound(_) => StatusCode::NOT_FOUND,
        Classified::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        Classified::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn respond(e: &Classified) -> HttpResponse {
    HttpResponse::build(status_for(e)).json(ErrorBody::from(e))
}
