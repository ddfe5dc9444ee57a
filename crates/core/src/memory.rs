// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// A simple flat memory storage
#[derive(Debug)]
pub struct LinearMemory {
    data: Vec<u8>,
    base_addr: u64,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u64) -> Self {
        Self {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn read_u8(&self, addr: u64) -> Option<u8> {
        if addr >= self.base_addr && addr < self.base_addr + self.data.len() as u64 {
            Some(self.data[(addr - self.base_addr) as usize])
        } else {
            None
        }
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> bool {
        if addr >= self.base_addr && addr < self.base_addr + self.data.len() as u64 {
            self.data[(addr - self.base_addr) as usize] = value;
            true
        } else {
            false
        }
    }

    pub fn read_u32(&self, addr: u64) -> Option<u32> {
        let b0 = self.read_u8(addr)? as u32;
        let b1 = self.read_u8(addr + 1)? as u32;
        let b2 = self.read_u8(addr + 2)? as u32;
        let b3 = self.read_u8(addr + 3)? as u32;
        // Little Endian
        Some(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> bool {
        // Reject partially-mapped words before mutating anything.
        if self.read_u8(addr).is_none() || self.read_u8(addr + 3).is_none() {
            return false;
        }
        self.write_u8(addr, (value & 0xFF) as u8)
            && self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)
            && self.write_u8(addr + 2, ((value >> 16) & 0xFF) as u8)
            && self.write_u8(addr + 3, ((value >> 24) & 0xFF) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = LinearMemory::new(1024, 0x1000);

        assert!(mem.write_u8(0x1000, 42));
        assert!(mem.write_u8(0x13FF, 99)); // Last byte

        // Out of bounds
        assert!(!mem.write_u8(0x0FFF, 1));
        assert!(!mem.write_u8(0x1400, 1));

        assert_eq!(mem.read_u8(0x1000), Some(42));
        assert_eq!(mem.read_u8(0x13FF), Some(99));
        assert_eq!(mem.read_u8(0x1400), None);
    }

    #[test]
    fn test_word_access_is_little_endian() {
        let mut mem = LinearMemory::new(1024, 0x2000_0000);
        assert!(mem.write_u32(0x2000_0000, 0x1234_5678));
        assert_eq!(mem.read_u8(0x2000_0000), Some(0x78));
        assert_eq!(mem.read_u8(0x2000_0003), Some(0x12));
        assert_eq!(mem.read_u32(0x2000_0000), Some(0x1234_5678));
    }

    #[test]
    fn test_word_access_straddling_end_rejected() {
        let mut mem = LinearMemory::new(8, 0x0);
        assert!(!mem.write_u32(0x6, 0xAABB_CCDD));
        assert_eq!(mem.read_u32(0x6), None);
        // Nothing was half-written.
        assert_eq!(mem.read_u8(0x6), Some(0));
        assert_eq!(mem.read_u8(0x7), Some(0));
    }
}
