// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Form validation.
//!
//! Each form is checked field by field; values are trimmed first. All
//! failures are collected into one field → message-key map so the caller
//! sees every problem at once.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::ApiError;
use crate::models::{ChangePasswordForm, LoginForm, RegisterForm};

/// Basic email format check on trimmed input.
fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

pub const USERNAME_EMPTY: &str = "validation.username_empty";
pub const PASSWORD_EMPTY: &str = "validation.password_empty";
pub const PASSWORD2_EMPTY: &str = "validation.password2_empty";
pub const PASSWORD2_NOT_SAME: &str = "validation.password2_not_same";
pub const INVALID_EMAIL: &str = "validation.invalid_email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    /// Lower-cased.
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePasswordInput {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Default)]
struct Errors(BTreeMap<String, String>);

impl Errors {
    /// Trimmed non-empty value, or record `key` against `field`.
    fn required(&mut self, field: &str, value: Option<&str>, key: &str) -> String {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            self.0.insert(field.to_string(), key.to_string());
        }
        value.to_string()
    }

    fn email(&mut self, field: &str, value: Option<&str>) -> String {
        let value = value.map(str::trim).unwrap_or_default();
        if !valid_email(value) {
            self.0.insert(field.to_string(), INVALID_EMAIL.to_string());
        }
        value.to_lowercase()
    }

    /// Confirmation field: required, then equal to `expected`.
    fn confirmation(&mut self, field: &str, value: Option<&str>, expected: &str) {
        let value = self.required(field, value, PASSWORD2_EMPTY);
        if !value.is_empty() && value != expected {
            self.0.insert(field.to_string(), PASSWORD2_NOT_SAME.to_string());
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::validation(self.0))
        }
    }
}

pub fn validate_register(form: &RegisterForm) -> Result<RegisterInput, ApiError> {
    let mut errors = Errors::default();
    let username = errors.required("username", form.username.as_deref(), USERNAME_EMPTY);
    let password = errors.required("password", form.password.as_deref(), PASSWORD_EMPTY);
    errors.confirmation("password2", form.password2.as_deref(), &password);
    let email = errors.email("email", form.email.as_deref());

    errors.finish(RegisterInput {
        username,
        password,
        email,
    })
}

pub fn validate_login(form: &LoginForm) -> Result<LoginInput, ApiError> {
    let mut errors = Errors::default();
    let password = errors.required("password", form.password.as_deref(), PASSWORD_EMPTY);
    let email = errors.email("email", form.email.as_deref());

    errors.finish(LoginInput { email, password })
}

pub fn validate_change_password(form: &ChangePasswordForm) -> Result<ChangePasswordInput, ApiError> {
    let mut errors = Errors::default();
    let username = errors.required("username", form.username.as_deref(), USERNAME_EMPTY);
    let new_password = errors.required("newPassword", form.new_password.as_deref(), PASSWORD_EMPTY);
    errors.confirmation("newPassword2", form.new_password2.as_deref(), &new_password);
    let old_password = errors.required("oldPassword", form.old_password.as_deref(), PASSWORD_EMPTY);

    errors.finish(ChangePasswordInput {
        username,
        old_password,
        new_password,
    })
}
