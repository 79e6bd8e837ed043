//! ISO-3166 alpha-2 country code → the numeric country byte the osu!
//! client's presence packet expects (§4.2 Session "country code", §4.7
//! step 8). Grounded on the upstream geo helper's `countryCodes` table;
//! a handful of entries map to 0 in that table itself (disputed or very
//! small territories), which this lookup reproduces rather than corrects.

const TABLE: &[([u8; 2], u8)] = &[
    (*b"IO", 104), (*b"PS", 178), (*b"LV", 132), (*b"GI", 82), (*b"MZ", 154), (*b"BZ", 37),
    (*b"TR", 217), (*b"CV", 52), (*b"BI", 26), (*b"CM", 47), (*b"JM", 109), (*b"GU", 91),
    (*b"CY", 54), (*b"BW", 35), (*b"KW", 120), (*b"MY", 153), (*b"SH", 193), (*b"PG", 171),
    (*b"PW", 180), (*b"FM", 72), (*b"HR", 97), (*b"YT", 238), (*b"JO", 110), (*b"HK", 94),
    (*b"MW", 151), (*b"AZ", 18), (*b"IQ", 105), (*b"DO", 60), (*b"RS", 239), (*b"PK", 173),
    (*b"BR", 31), (*b"SN", 199), (*b"LI", 126), (*b"CD", 40), (*b"MG", 137), (*b"PE", 169),
    (*b"CK", 45), (*b"SJ", 195), (*b"SZ", 205), (*b"PM", 175), (*b"LY", 133), (*b"BV", 34),
    (*b"KN", 117), (*b"GR", 88), (*b"CC", 39), (*b"IN", 103), (*b"DZ", 61), (*b"SK", 196),
    (*b"VC", 229), (*b"GW", 92), (*b"BQ", 0), (*b"UM", 224), (*b"AF", 5), (*b"TZ", 221),
    (*b"AO", 11), (*b"AW", 17), (*b"AE", 0), (*b"PF", 170), (*b"MK", 139), (*b"AR", 13),
    (*b"AQ", 12), (*b"SL", 197), (*b"HT", 98), (*b"NF", 158), (*b"SS", 190), (*b"MU", 149),
    (*b"VA", 228), (*b"EC", 62), (*b"LC", 125), (*b"MX", 152), (*b"CW", 0), (*b"LT", 130),
    (*b"GN", 85), (*b"ZM", 241), (*b"LU", 131), (*b"NG", 159), (*b"MS", 147), (*b"MV", 150),
    (*b"DJ", 57), (*b"MQ", 145), (*b"IE", 101), (*b"CG", 40), (*b"LK", 127), (*b"NZ", 166),
    (*b"KR", 119), (*b"RO", 184), (*b"KE", 112), (*b"MF", 252), (*b"SR", 201), (*b"PA", 168),
    (*b"KI", 115), (*b"NL", 161), (*b"DM", 59), (*b"TC", 206), (*b"KZ", 122), (*b"CR", 50),
    (*b"NR", 164), (*b"UZ", 227), (*b"GE", 79), (*b"KP", 118), (*b"PN", 176), (*b"BY", 36),
    (*b"NI", 160), (*b"IR", 106), (*b"VI", 232), (*b"MA", 134), (*b"NO", 162), (*b"PT", 179),
    (*b"PY", 181), (*b"CU", 51), (*b"SC", 189), (*b"TT", 218), (*b"CA", 38), (*b"IT", 108),
    (*b"GF", 80), (*b"CN", 48), (*b"GQ", 87), (*b"LR", 128), (*b"BA", 19), (*b"TD", 207),
    (*b"AU", 16), (*b"MM", 141), (*b"HU", 99), (*b"EG", 64), (*b"JE", 250), (*b"IL", 102),
    (*b"BL", 251), (*b"BS", 32), (*b"SE", 191), (*b"MC", 135), (*b"SD", 190), (*b"ZA", 240),
    (*b"IM", 249), (*b"MO", 143), (*b"GL", 83), (*b"TV", 219), (*b"FK", 71), (*b"GB", 77),
    (*b"NA", 155), (*b"AM", 9), (*b"WS", 236), (*b"UY", 226), (*b"EE", 63), (*b"TL", 216),
    (*b"BT", 33), (*b"VU", 234), (*b"WF", 235), (*b"AX", 247), (*b"TK", 212), (*b"MN", 142),
    (*b"SB", 188), (*b"XK", 0), (*b"BH", 25), (*b"ID", 100), (*b"SV", 203), (*b"TG", 209),
    (*b"BF", 23), (*b"GG", 248), (*b"IS", 107), (*b"FJ", 70), (*b"KG", 113), (*b"BD", 21),
    (*b"ZW", 243), (*b"AI", 7), (*b"NP", 163), (*b"KH", 114), (*b"BJ", 27), (*b"EH", 65),
    (*b"BE", 22), (*b"SM", 198), (*b"CX", 53), (*b"TW", 220), (*b"KM", 116), (*b"AS", 14),
    (*b"AT", 15), (*b"LA", 123), (*b"US", 225), (*b"SY", 204), (*b"SO", 200), (*b"AD", 3),
    (*b"OM", 167), (*b"GT", 90), (*b"CF", 41), (*b"GY", 93), (*b"VN", 233), (*b"VE", 230),
    (*b"PH", 172), (*b"TM", 213), (*b"VG", 231), (*b"GP", 86), (*b"CZ", 55), (*b"GM", 84),
    (*b"MR", 146), (*b"TN", 214), (*b"SI", 194), (*b"TO", 215), (*b"UG", 223), (*b"SA", 187),
    (*b"ST", 202), (*b"QA", 182), (*b"FI", 69), (*b"CO", 49), (*b"AG", 6), (*b"PR", 177),
    (*b"PL", 174), (*b"GH", 81), (*b"GA", 76), (*b"TJ", 211), (*b"SX", 0), (*b"KY", 121),
    (*b"BO", 30), (*b"UA", 222), (*b"MP", 144), (*b"TF", 208), (*b"LB", 124), (*b"MT", 148),
    (*b"FR", 74), (*b"JP", 111), (*b"RU", 185), (*b"RW", 186), (*b"NC", 156), (*b"NE", 157),
    (*b"BN", 29), (*b"CI", 44), (*b"TH", 210), (*b"DE", 56), (*b"ET", 68), (*b"FO", 73),
    (*b"YE", 237), (*b"DK", 58), (*b"BG", 24), (*b"GS", 89), (*b"HM", 95), (*b"BB", 20),
    (*b"BM", 28), (*b"ML", 140), (*b"SG", 192), (*b"GD", 78), (*b"NU", 165), (*b"RE", 183),
    (*b"LS", 129), (*b"ER", 66), (*b"ME", 242), (*b"HN", 96), (*b"AL", 8), (*b"CH", 43),
    (*b"MD", 136), (*b"ES", 67), (*b"CL", 46), (*b"MH", 138),
];

/// Returns 0 ("XX"/unknown) for any code not in the table, matching the
/// upstream lookup's fallback.
pub fn code_to_byte(code: &str) -> u8 {
    let bytes = code.as_bytes();
    if bytes.len() != 2 {
        return 0;
    }
    let upper = [bytes[0].to_ascii_uppercase(), bytes[1].to_ascii_uppercase()];
    TABLE
        .iter()
        .find(|(key, _)| *key == upper)
        .map(|(_, value)| *value)
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_code_resolves() {
        assert_eq!(code_to_byte("US"), 225);
        assert_eq!(code_to_byte("jp"), 111);
    }

    #[test]
    fn unknown_code_is_zero() {
        assert_eq!(code_to_byte("XX"), 0);
        assert_eq!(code_to_byte("??"), 0);
    }
}
