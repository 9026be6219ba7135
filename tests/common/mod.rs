#![allow(dead_code)]

pub fn hash(px: [u8; 4]) -> u8 {
    let [r, g, b, a] = px.map(usize::from);
    ((r * 3 + g * 5 + b * 7 + a * 11) % 64) as u8
}

pub fn header(width: u32, height: u32, channels: u8, colorspace: u8) -> Vec<u8> {
    let mut out = b"qoif".to_vec();
    out.extend(width.to_be_bytes());
    out.extend(height.to_be_bytes());
    out.push(channels);
    out.push(colorspace);
    out
}

pub fn end_marker() -> [u8; 8] {
    [0, 0, 0, 0, 0, 0, 0, 1]
}

/// Builds a complete stream from a header and raw chunk bytes.
pub fn stream(width: u32, height: u32, chunks: &[u8]) -> Vec<u8> {
    let mut out = header(width, height, 4, 0);
    out.extend(chunks);
    out.extend(end_marker());
    out
}

pub fn to_bytes(pixels: &[[u8; 4]]) -> Vec<u8> {
    pixels.iter().flatten().copied().collect()
}

/// Straightforward encoder following the chunk priority order step by step.
pub fn reference_encode(pixels: &[[u8; 4]], width: u32, height: u32) -> Vec<u8> {
    let mut out = header(width, height, 4, 0);
    let mut index = [[0_u8; 4]; 64];
    let mut prev = [0, 0, 0, 255];
    let mut run = 0_u8;

    for &px in pixels {
        if px == prev {
            run += 1;
            if run == 62 {
                out.push(0xc0 | (run - 1));
                index[hash(prev) as usize] = prev;
                run = 0;
            }
            continue;
        }
        if run > 0 {
            out.push(0xc0 | (run - 1));
            index[hash(prev) as usize] = prev;
            run = 0;
        }

        let h = hash(px);
        if index[h as usize] == px {
            out.push(h);
        } else if px[3] == prev[3] {
            let dr = i32::from(px[0]) - i32::from(prev[0]);
            let dg = i32::from(px[1]) - i32::from(prev[1]);
            let db = i32::from(px[2]) - i32::from(prev[2]);
            let (dr_dg, db_dg) = (dr - dg, db - dg);
            if [dr, dg, db].iter().all(|d| (-2..=1).contains(d)) {
                out.push(0x40 | ((dr + 2) << 4 | (dg + 2) << 2 | (db + 2)) as u8);
            } else if (-32..=31).contains(&dg)
                && (-8..=7).contains(&dr_dg)
                && (-8..=7).contains(&db_dg)
            {
                out.push(0x80 | (dg + 32) as u8);
                out.push(((dr_dg + 8) << 4 | (db_dg + 8)) as u8);
            } else {
                out.extend([0xfe, px[0], px[1], px[2]]);
            }
        } else {
            out.extend([0xff, px[0], px[1], px[2], px[3]]);
        }
        index[h as usize] = px;
        prev = px;
    }
    if run > 0 {
        out.push(0xc0 | (run - 1));
    }
    out.extend(end_marker());
    out
}
