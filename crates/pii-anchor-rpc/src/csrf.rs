// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Anti-forgery token lookup in a `Cookie` header value.

use percent_encoding::percent_decode_str;

/// Value of cookie `name` in a `name=value; other=value` header, percent-decoded.
///
/// Empty values count as absent.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key.trim() != name {
            return None;
        }
        let decoded = percent_decode_str(value.trim()).decode_utf8_lossy();
        (!decoded.is_empty()).then(|| decoded.into_owned())
    })
}
