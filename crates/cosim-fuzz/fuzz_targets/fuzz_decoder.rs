#![no_main]

use cosim_core::channel::frame::FrameReader;
use cosim_protocol::codec::{
    decode_connect, decode_connect_ok, decode_step_header, decode_step_ok_header, decode_terminate,
    read_frame_kind,
};
use cosim_protocol::frame_kind::FrameKind;
use libfuzzer_sys::fuzz_target;

// Feeds arbitrary bytes through the length-prefixed frame reader and, for
// whatever frame kind comes out, the matching body decoder. Neither stage
// should ever panic, only return an error.
fuzz_target!(|data: &[u8]| {
    let mut reader = FrameReader::new();
    let mut remaining = data;

    let result = reader.begin_read(|dst| {
        let n = dst.len().min(remaining.len());
        dst[..n].copy_from_slice(&remaining[..n]);
        remaining = &remaining[n..];
        if n == 0 {
            Err(cosim_core::error::Error::NotConnected)
        } else {
            Ok(n)
        }
    });

    if result.is_err() {
        return;
    }

    let Ok(kind) = read_frame_kind(&mut reader) else {
        return;
    };

    let _ = match kind {
        FrameKind::Connect => decode_connect(&mut reader).map(|_| ()),
        FrameKind::ConnectOk => decode_connect_ok(&mut reader).map(|_| ()),
        FrameKind::Step => decode_step_header(&mut reader).map(|_| ()),
        FrameKind::StepOk => decode_step_ok_header(&mut reader).map(|_| ()),
        FrameKind::Terminate => decode_terminate(&mut reader).map(|_| ()),
        _ => Ok(()),
    };

    let _ = reader.end_read();
});
