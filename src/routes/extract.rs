// ABOUTME: Request extractors that reject malformed bodies and queries with the JSON error envelope
// ABOUTME: Wrap axum's Json and Query so rejections surface as InvalidInput AppErrors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// JSON request body whose rejection renders as an `InvalidInput` error
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejection renders as an `InvalidInput` error
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
