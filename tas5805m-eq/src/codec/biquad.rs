//! Biquad coefficient programming.
//!
//! Single-slot writes go through [`Tas5805m::write_biquad`], which switches
//! pages once per record. The batched variants write every record sharing a
//! page after a single page switch, which cuts a full-channel update from 60
//! bus transactions to about 30.
//!
//! Every operation here validates its arguments before touching the bus and
//! leaves the register window on book 0 / page 0 when it returns.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::registers::{self as reg, BIQUAD_RECORD_LEN};
use super::tas5805m::Tas5805m;
use crate::biquad::{check_index, BiquadCoefficients, Channel, Side};
use crate::constants::{BIQUADS_PER_CHANNEL, BIQUADS_PER_PAGE, PAGES_PER_CHANNEL};
use crate::error::{keep_first, Error, Parameter, Result};
use crate::fixed::{encode_9_23, pack_be32};

/// Encode one biquad as the chip stores it: five big-endian 9.23 words in
/// the order `b0, b1, b2, -a1, -a2`.
pub fn encode_record(coeffs: &BiquadCoefficients) -> [u8; BIQUAD_RECORD_LEN] {
    let words = [
        coeffs.b0,
        coeffs.b1,
        coeffs.b2,
        -coeffs.a1,
        -coeffs.a2,
    ];
    let mut record = [0u8; BIQUAD_RECORD_LEN];
    for (chunk, &w) in record.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&pack_be32(encode_9_23(w)));
    }
    record
}

impl<I2C, D> Tas5805m<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    // ── Single-slot writes ─────────────────────────────────────────────

    /// Program biquad `index` (0–14) of `channel`.
    ///
    /// With [`Channel::Both`] the left write is attempted first and the right
    /// write is attempted even if the left one failed; the first error is
    /// returned.
    pub fn write_biquad(
        &mut self,
        channel: Channel,
        index: usize,
        coeffs: &BiquadCoefficients,
    ) -> Result<()> {
        check_index(index)?;

        let record = encode_record(coeffs);
        log::debug!(
            "Biquad {}: b0={} b1={} b2={} a1={} a2={}",
            index,
            coeffs.b0,
            coeffs.b1,
            coeffs.b2,
            coeffs.a1,
            coeffs.a2
        );
        log::debug!("Biquad {} record: {:02X?}", index, record);

        let mut session = self.coefficient_session();
        let mut first = None;
        for side in channel.sides() {
            let result = session.program_record(side, index, &record);
            if result.is_ok() {
                session.record_shadow(side, index, *coeffs);
                log::info!("Biquad {:?}[{}] written", side, index);
            }
            keep_first(&mut first, result);
        }
        first.map_or(Ok(()), Err)
    }

    /// Restore slot `index` of `channel` to bypass.
    pub fn reset_biquad(&mut self, channel: Channel, index: usize) -> Result<()> {
        self.write_biquad(channel, index, &BiquadCoefficients::BYPASS)
    }

    /// Restore all 30 slots to bypass, one record at a time.
    ///
    /// Every slot is attempted; the first error is returned.
    pub fn reset_all_biquads(&mut self) -> Result<()> {
        let mut first = None;
        for index in 0..BIQUADS_PER_CHANNEL {
            keep_first(&mut first, self.reset_biquad(Channel::Both, index));
        }
        match first {
            None => {
                log::info!("All biquads reset to bypass");
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    fn program_record(
        &mut self,
        side: Side,
        index: usize,
        record: &[u8; BIQUAD_RECORD_LEN],
    ) -> Result<()> {
        self.select_book_page(reg::BOOK_COEFF, reg::biquad_page(side, index))?;
        self.write_bytes(reg::biquad_offset(index), record)?;
        self.delay_ms(self.config().commit_ms);
        Ok(())
    }

    // ── Batched writes ─────────────────────────────────────────────────

    /// Program 1–4 consecutive records on one coefficient page with a single
    /// page switch.
    ///
    /// `page` must belong to `side` (0x24–0x27 left, 0x32–0x35 right) and
    /// `coeffs` must fit on it. The last page of each channel (0x27, 0x35)
    /// holds only biquads 12–14, so four records there are rejected with
    /// [`Parameter::PageCount`] rather than spilling past biquad 14.
    pub fn write_biquads_page(
        &mut self,
        side: Side,
        page: u8,
        coeffs: &[BiquadCoefficients],
    ) -> Result<()> {
        check_page(side, page, coeffs.len())?;
        let mut session = self.coefficient_session();
        session.program_page(side, page, coeffs)
    }

    /// Program all 15 slots of one side, one page switch per page.
    ///
    /// [`Channel::Both`] is rejected. Every page is attempted; the first
    /// error is returned.
    pub fn write_channel_biquads_batched(
        &mut self,
        channel: Channel,
        coeffs: &[BiquadCoefficients; BIQUADS_PER_CHANNEL],
    ) -> Result<()> {
        let side = Side::try_from(channel).map_err(|e| {
            log::error!("Batched write needs a single channel, got {:?}", channel);
            e
        })?;

        let mut session = self.coefficient_session();
        let mut first = None;
        for p in 0..PAGES_PER_CHANNEL {
            let start = p * BIQUADS_PER_PAGE;
            let end = reg::page_capacity(start) + start;
            let page = reg::first_page(side) + p as u8;
            keep_first(&mut first, session.program_page(side, page, &coeffs[start..end]));
        }
        match first {
            None => {
                log::info!("{:?} channel written (batched)", side);
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    /// Program both sides, batched. The right side is attempted even if the
    /// left one failed.
    pub fn write_all_biquads_batched(
        &mut self,
        left: &[BiquadCoefficients; BIQUADS_PER_CHANNEL],
        right: &[BiquadCoefficients; BIQUADS_PER_CHANNEL],
    ) -> Result<()> {
        let l = self.write_channel_biquads_batched(Channel::Left, left);
        let r = self.write_channel_biquads_batched(Channel::Right, right);
        l.and(r)
    }

    /// Restore all 30 slots to bypass using the batched path.
    pub fn reset_all_biquads_batched(&mut self) -> Result<()> {
        let bypass = [BiquadCoefficients::BYPASS; BIQUADS_PER_CHANNEL];
        self.write_all_biquads_batched(&bypass, &bypass)
    }

    fn program_page(&mut self, side: Side, page: u8, coeffs: &[BiquadCoefficients]) -> Result<()> {
        let first_index = check_page(side, page, coeffs.len())?;
        self.select_book_page(reg::BOOK_COEFF, page)?;

        let mut first = None;
        for (i, c) in coeffs.iter().enumerate() {
            let result = self.write_bytes(reg::RECORD_OFFSETS[i], &encode_record(c));
            if result.is_ok() {
                self.record_shadow(side, first_index + i, *c);
            }
            keep_first(&mut first, result);
        }
        self.delay_ms(self.config().commit_ms);
        log::debug!(
            "Page 0x{:02X}: {} records from biquad {}",
            page,
            coeffs.len(),
            first_index
        );
        first.map_or(Ok(()), Err)
    }
}

/// Validate a page write; returns the first biquad index on the page.
fn check_page(side: Side, page: u8, count: usize) -> Result<usize> {
    let Some(first_index) = reg::page_first_index(side, page) else {
        log::error!("Page 0x{:02X} is not a {:?} coefficient page", page, side);
        return Err(Error::InvalidParameter(Parameter::Page));
    };
    let capacity = reg::page_capacity(first_index);
    if count == 0 || count > capacity {
        log::error!(
            "Invalid record count for page 0x{:02X}: {} (must be 1-{})",
            page,
            count,
            capacity
        );
        return Err(Error::InvalidParameter(Parameter::PageCount));
    }
    Ok(first_index)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{nack, MockDelay, MockI2c};

    fn make_amp(i2c: MockI2c) -> Tas5805m<MockI2c, MockDelay> {
        Tas5805m::new(i2c, MockDelay::new())
    }

    fn sample() -> BiquadCoefficients {
        BiquadCoefficients::new(1.0, 0.5, 0.25, -0.5, 0.1)
    }

    #[test]
    fn record_layout_negates_feedback_terms() {
        let rec = encode_record(&BiquadCoefficients::new(1.0, 0.0, 0.0, 1.0, 0.5));
        assert_eq!(&rec[0..4], &[0x00, 0x80, 0x00, 0x00]);
        assert_eq!(&rec[4..12], &[0; 8]);
        assert_eq!(&rec[12..16], &[0xFF, 0x80, 0x00, 0x00]);
        assert_eq!(&rec[16..20], &[0xFF, 0xC0, 0x00, 0x00]);
    }

    #[test]
    fn single_left_write_sequence() {
        let mut amp = make_amp(MockI2c::new());
        amp.write_biquad(Channel::Left, 5, &sample()).unwrap();
        let (i2c, delay) = amp.release();
        // page 0, book, page, record, page 0, book 0
        assert_eq!(i2c.call_count(), 6);
        assert_eq!(i2c.write_at(2), &[0x00, 0x25]);
        let rec = i2c.write_at(3);
        assert_eq!(rec.len(), 21);
        assert_eq!(rec[0], 0x1C);
        assert_eq!(&rec[1..5], &[0x00, 0x80, 0x00, 0x00]);
        assert_eq!(i2c.write_at(4), &[0x00, 0x00]);
        assert_eq!(i2c.write_at(5), &[0x7F, 0x00]);
        assert_eq!(delay.calls, vec![2, 2, 2, 5]);
    }

    #[test]
    fn both_channels_write_left_then_right() {
        let mut amp = make_amp(MockI2c::new());
        amp.write_biquad(Channel::Both, 0, &sample()).unwrap();
        let (i2c, _) = amp.release();
        assert!(i2c.call_count() >= 8);
        let records = i2c.record_writes();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1..5], &[0x00, 0x80, 0x00, 0x00]);
        assert_eq!(records[0], records[1]);
        let pages = i2c.page_selects();
        let left = pages.iter().position(|&p| p == 0x24).unwrap();
        let right = pages.iter().position(|&p| p == 0x32).unwrap();
        assert!(left < right);
    }

    #[test]
    fn invalid_index_performs_no_io() {
        let mut amp = make_amp(MockI2c::new());
        assert_eq!(
            amp.write_biquad(Channel::Left, 15, &sample()),
            Err(Error::InvalidParameter(Parameter::Index))
        );
        let (i2c, _) = amp.release();
        assert_eq!(i2c.call_count(), 0);
    }

    #[test]
    fn right_channel_uses_right_pages() {
        let mut amp = make_amp(MockI2c::new());
        for index in [0, 4, 8, 12] {
            amp.write_biquad(Channel::Right, index, &sample()).unwrap();
        }
        let (i2c, _) = amp.release();
        let coeff_pages: Vec<u8> = i2c.page_selects().into_iter().filter(|&p| p != 0).collect();
        assert_eq!(coeff_pages, vec![0x32, 0x33, 0x34, 0x35]);
    }

    #[test]
    fn write_updates_shadow() {
        let mut amp = make_amp(MockI2c::new());
        amp.write_biquad(Channel::Right, 3, &sample()).unwrap();
        assert_eq!(amp.shadow(Side::Right)[3], sample());
        assert!(amp.shadow(Side::Left)[3].is_bypass());
    }

    #[test]
    fn persistent_nack_fails_and_leaves_shadow() {
        let mut amp = make_amp(MockI2c::failing(nack()));
        assert!(amp.write_biquad(Channel::Left, 0, &sample()).is_err());
        assert!(amp.shadow(Side::Left)[0].is_bypass());
    }

    #[test]
    fn left_failure_still_attempts_right() {
        // The left book write fails all three attempts.
        let mut amp = make_amp(MockI2c::fail_after(1, 3));
        assert!(amp.write_biquad(Channel::Both, 2, &sample()).is_err());
        assert!(amp.shadow(Side::Left)[2].is_bypass());
        assert_eq!(amp.shadow(Side::Right)[2], sample());
        let (i2c, _) = amp.release();
        assert_eq!(i2c.record_writes().len(), 1);
    }

    #[test]
    fn partial_failure_reports_error() {
        // Left succeeds (4 calls), then the right book write starts failing.
        let mut amp = make_amp(MockI2c::fail_after(5, 100));
        assert!(amp.write_biquad(Channel::Both, 0, &sample()).is_err());
        assert_eq!(amp.shadow(Side::Left)[0], sample());
        assert!(amp.shadow(Side::Right)[0].is_bypass());
    }

    #[test]
    fn reset_all_writes_thirty_bypass_records() {
        let mut amp = make_amp(MockI2c::new());
        amp.reset_all_biquads().unwrap();
        let (i2c, _) = amp.release();
        let records = i2c.record_writes();
        assert_eq!(records.len(), 30);
        let bypass = encode_record(&BiquadCoefficients::BYPASS);
        assert!(records.iter().all(|r| r[1..] == bypass));
    }

    #[test]
    fn batched_channel_uses_four_page_switches() {
        let mut amp = make_amp(MockI2c::new());
        let coeffs = [sample(); BIQUADS_PER_CHANNEL];
        amp.write_channel_biquads_batched(Channel::Left, &coeffs).unwrap();
        let (i2c, _) = amp.release();
        assert_eq!(i2c.record_writes().len(), 15);
        assert!(i2c.page_selects().len() < 20);
        let coeff_pages: Vec<u8> = i2c.page_selects().into_iter().filter(|&p| p != 0).collect();
        assert_eq!(coeff_pages, vec![0x24, 0x25, 0x26, 0x27]);
        let offsets: Vec<u8> = i2c.record_writes().iter().map(|r| r[0]).collect();
        assert_eq!(&offsets[12..], &[0x08, 0x1C, 0x30]);
    }

    #[test]
    fn batched_rejects_both() {
        let mut amp = make_amp(MockI2c::new());
        let coeffs = [sample(); BIQUADS_PER_CHANNEL];
        assert_eq!(
            amp.write_channel_biquads_batched(Channel::Both, &coeffs),
            Err(Error::InvalidParameter(Parameter::Channel))
        );
        let (i2c, _) = amp.release();
        assert_eq!(i2c.call_count(), 0);
    }

    #[test]
    fn batched_updates_shadow() {
        let mut amp = make_amp(MockI2c::new());
        let mut coeffs = [BiquadCoefficients::BYPASS; BIQUADS_PER_CHANNEL];
        coeffs[13] = sample();
        amp.write_channel_biquads_batched(Channel::Right, &coeffs).unwrap();
        assert_eq!(amp.shadow(Side::Right)[13], sample());
    }

    #[test]
    fn page_write_validation() {
        let mut amp = make_amp(MockI2c::new());
        assert_eq!(
            amp.write_biquads_page(Side::Left, 0x24, &[]),
            Err(Error::InvalidParameter(Parameter::PageCount))
        );
        assert_eq!(
            amp.write_biquads_page(Side::Left, 0x24, &[sample(); 5]),
            Err(Error::InvalidParameter(Parameter::PageCount))
        );
        assert_eq!(
            amp.write_biquads_page(Side::Left, 0x27, &[sample(); 4]),
            Err(Error::InvalidParameter(Parameter::PageCount))
        );
        assert_eq!(
            amp.write_biquads_page(Side::Left, 0x32, &[sample()]),
            Err(Error::InvalidParameter(Parameter::Page))
        );
        let (i2c, _) = amp.release();
        assert_eq!(i2c.call_count(), 0);
    }

    #[test]
    fn page_write_single_switch() {
        let mut amp = make_amp(MockI2c::new());
        amp.write_biquads_page(Side::Right, 0x33, &[sample(); 4]).unwrap();
        let (i2c, delay) = amp.release();
        // 3 select + 4 records + 2 return
        assert_eq!(i2c.call_count(), 9);
        assert_eq!(i2c.record_writes().len(), 4);
        assert_eq!(delay.calls, vec![2, 2, 2, 5]);
    }

    #[test]
    fn batched_reset_writes_thirty_records() {
        let mut amp = make_amp(MockI2c::new());
        amp.reset_all_biquads_batched().unwrap();
        let (i2c, _) = amp.release();
        assert_eq!(i2c.record_writes().len(), 30);
        assert!(i2c.page_selects().len() < 40);
    }

    #[test]
    fn batched_failure_continues_with_other_pages() {
        // Book write of the first page fails; remaining pages still go out.
        let mut amp = make_amp(MockI2c::fail_after(1, 3));
        let coeffs = [sample(); BIQUADS_PER_CHANNEL];
        assert!(amp.write_channel_biquads_batched(Channel::Left, &coeffs).is_err());
        let (i2c, _) = amp.release();
        assert_eq!(i2c.record_writes().len(), 11);
    }
}
