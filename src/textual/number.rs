// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::AvroResult;
use crate::error::Details;

/// Returns the length of the valid JSON number at the front of `buf`.
///
/// A small state machine over: an optional minus, an integer part (`0` or
/// `[1-9][0-9]*`), and, when `float_allowed`, an optional fractional part and
/// an optional exponent. The caller parses the accepted prefix with the
/// standard library's decimal parser.
pub(crate) fn number_length(buf: &[u8], float_allowed: bool) -> AvroResult<usize> {
    let buflen = buf.len();
    let mut index = 0;

    // STATE 0: begin, optional minus
    if index == buflen {
        return Err(Details::TextShortBuffer.into());
    }
    if buf[index] == b'-' {
        index += 1;
        if index == buflen {
            return Err(Details::TextShortBuffer.into());
        }
    }

    // STATE 1: if 0, go to the fraction; if 1-9, absorb digits; otherwise bail
    match buf[index] {
        b'0' => {
            index += 1;
            if index == buflen {
                return Ok(index); // valid number
            }
        }
        b'1'..=b'9' => {
            index += 1;
            if index == buflen {
                return Ok(index); // valid number
            }
            // STATE 3: absorb zero or more digits
            while buf[index].is_ascii_digit() {
                index += 1;
                if index == buflen {
                    return Ok(index); // valid number
                }
            }
        }
        b => return Err(Details::TextUnexpectedNumberByte(b as char).into()),
    }

    if !float_allowed {
        return Ok(index);
    }

    // STATE 2: optional fraction
    if buf[index] == b'.' {
        index += 1;
        if index == buflen {
            return Err(Details::TextShortBuffer.into());
        }
        // STATE 4: absorb one or more digits
        let mut count = 0;
        while buf[index].is_ascii_digit() {
            count += 1;
            index += 1;
            if index == buflen {
                return Ok(index); // valid number
            }
        }
        if count == 0 {
            // did not get at least one digit
            return Err(Details::TextUnexpectedNumberByte(buf[index] as char).into());
        }
    }

    // STATE 5: optional exponent
    if buf[index] == b'e' || buf[index] == b'E' {
        index += 1;
        if index == buflen {
            return Err(Details::TextShortBuffer.into());
        }
        // STATE 6: optional exponent sign
        if buf[index] == b'+' || buf[index] == b'-' {
            index += 1;
            if index == buflen {
                return Err(Details::TextShortBuffer.into());
            }
        }
        // STATE 7: absorb one or more digits
        let mut count = 0;
        while buf[index].is_ascii_digit() {
            count += 1;
            index += 1;
            if index == buflen {
                return Ok(index); // valid number
            }
        }
        if count == 0 {
            return Err(Details::TextUnexpectedNumberByte(buf[index] as char).into());
        }
    }

    Ok(index)
}
