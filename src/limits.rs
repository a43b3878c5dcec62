use std::collections::HashMap;

use axum::http::HeaderMap;

const PER_CLIENT_BUDGET: u32 = 60 + 10; // per minute, plus burst
const GLOBAL_BUDGET: u32 = 200 + 20;
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Proxy headers that carry the caller's address, most trusted first.
const CLIENT_ADDR_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Client,
    Global,
}

#[derive(Debug, Default, Clone, Copy)]
struct Window {
    minute: i64,
    used: u32,
}

impl Window {
    fn admit(&mut self, minute: i64, budget: u32) -> bool {
        if self.minute != minute {
            *self = Window { minute, used: 0 };
        }
        if self.used >= budget {
            return false;
        }
        self.used += 1;
        true
    }
}

/// Fixed one-minute admission windows for catalog-backed endpoints, counted per
/// client and across all clients.
#[derive(Debug, Default)]
pub struct RequestLimiter {
    clients: HashMap<String, Window>,
    global: Window,
}

impl RequestLimiter {
    /// Count one request from `client` in `minute` (Unix time / 60).
    pub fn admit(&mut self, client: &str, minute: i64) -> Result<(), Rejection> {
        if self.clients.len() > MAX_TRACKED_CLIENTS {
            self.clients.retain(|_, w| w.minute == minute);
        }
        let window = self.clients.entry(client.to_string()).or_insert(Window {
            minute,
            used: 0,
        });
        if !window.admit(minute, PER_CLIENT_BUDGET) {
            return Err(Rejection::Client);
        }
        if !self.global.admit(minute, GLOBAL_BUDGET) {
            return Err(Rejection::Global);
        }
        Ok(())
    }
}

/// Caller address as reported by the fronting proxy, `unknown` when absent.
pub fn client_addr(headers: &HeaderMap) -> String {
    CLIENT_ADDR_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}
