// src/utils/mod.rs

pub mod html;
pub mod jwt;
pub mod mail;
pub mod otp;
pub mod password;
pub mod redirect;
