// NetModeler: Reconciling Polled Device Observations into a Network Topology
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Helper (printer) functions for labels
//! Module containing helper functions to get human readable strings of durations, counters and
//! network masks.

use ipnet::{ipv4_mask_to_prefix, Ipv4Net};
use std::net::Ipv4Addr;

const SECS_PER_YEAR: f64 = 365.25 * 86400.0;
const SECS_PER_MONTH: f64 = SECS_PER_YEAR / 12.0;
const SECS_PER_DAY: f64 = 86400.0;
const SECS_PER_HOUR: f64 = 3600.0;

/// Returns a human readable duration, like `3.2 hours` or `1 minute`. The unit is only pluralized
/// if the rendered value is not exactly `1`.
pub fn secs_to_str(secs: f64) -> String {
    let (value, unit) = if secs >= SECS_PER_YEAR {
        (format!("{:.2}", secs / SECS_PER_YEAR), "year")
    } else if secs >= SECS_PER_MONTH {
        (format!("{:.2}", secs / SECS_PER_MONTH), "month")
    } else if secs >= SECS_PER_DAY {
        (format!("{:.1}", secs / SECS_PER_DAY), "day")
    } else if secs >= SECS_PER_HOUR {
        (format!("{:.1}", secs / SECS_PER_HOUR), "hour")
    } else if secs >= 60.0 {
        (format!("{:.0}", secs / 60.0), "minute")
    } else if secs >= 1.0 {
        (format!("{:.0}", secs), "second")
    } else {
        (format!("{:.3}", secs * 1000.0), "msec")
    };
    if value == "1" {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

/// Format a counter with an SI suffix. The result always ends with a space (or the suffix), such
/// that a unit can be appended directly, like `format!("{}pkt", to_si(x))`.
pub fn to_si(value: f64) -> String {
    if value > 1e9 {
        format!("{:.1} G", value / 1e9)
    } else if value > 1e6 {
        format!("{:.1} M", value / 1e6)
    } else if value > 1e4 {
        format!("{:.1} K", value / 1e3)
    } else {
        format!("{:.0} ", value)
    }
}

/// Returns the prefix length of a contiguous mask, or the dotted mask itself for unusual masks
/// where ones and zeros are mixed.
pub fn mask_to_subnet(mask: Ipv4Addr) -> String {
    match ipv4_mask_to_prefix(mask) {
        Ok(len) => len.to_string(),
        Err(_) => mask.to_string(),
    }
}

/// Returns the subnet in CIDR notation, like `10.0.2.0/24`. Falls back to `subnet/mask` for
/// non-contiguous masks.
pub fn cidr(subnet: Ipv4Addr, mask: Ipv4Addr) -> String {
    match ipv4_mask_to_prefix(mask).and_then(|len| Ipv4Net::new(subnet, len)) {
        Ok(net) => net.trunc().to_string(),
        Err(_) => format!("{}/{}", subnet, mask),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(secs_to_str(60.0), "1 minute");
        assert_eq!(secs_to_str(150.0), "2 minutes");
        assert_eq!(secs_to_str(11520.0), "3.2 hours");
        assert_eq!(secs_to_str(30.0), "30 seconds");
        assert_eq!(secs_to_str(1.0), "1 second");
        assert_eq!(secs_to_str(0.25), "250.000 msecs");
        assert_eq!(secs_to_str(2.0 * 86400.0), "2.0 days");
    }

    #[test]
    fn si_suffix() {
        assert_eq!(to_si(12.0), "12 ");
        assert_eq!(to_si(25_000.0), "25.0 K");
        assert_eq!(to_si(3_500_000.0), "3.5 M");
        assert_eq!(to_si(2e9 + 1.0), "2.0 G");
    }

    #[test]
    fn masks() {
        assert_eq!(mask_to_subnet(Ipv4Addr::new(255, 255, 255, 0)), "24");
        assert_eq!(mask_to_subnet(Ipv4Addr::new(0, 0, 0, 0)), "0");
        assert_eq!(mask_to_subnet(Ipv4Addr::new(255, 0, 255, 0)), "255.0.255.0");
        assert_eq!(
            cidr(Ipv4Addr::new(10, 0, 2, 7), Ipv4Addr::new(255, 255, 255, 0)),
            "10.0.2.0/24"
        );
    }
}
