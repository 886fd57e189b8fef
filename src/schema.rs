/// Legacy flow-export column names and their canonical replacements.
pub const RENAMES: &[(&str, &str)] = &[
    ("Total_Fwd_Packets", "Fwd_Total_Pkts"),
    ("Total_Backward_Packets", "Bwd_Total_Pkts"),
    ("Total_Length_of_Fwd_Packets", "Fwd_Total_Bytes"),
    ("Total_Length_of_Bwd_Packets", "Bwd_Total_Bytes"),
    ("Flow_Bytes_s", "Flow_Bytes_Sec"),
    ("Flow_Packets_s", "Flow_Pkts_Sec"),
    ("Fwd_Packets_s", "Fwd_Pkts_Sec"),
    ("Bwd_Packets_s", "Bwd_Pkts_Sec"),
    ("Min_Packet_Length", "Pkt_Length_Min"),
    ("Max_Packet_Length", "Pkt_Length_Max"),
    ("Packet_Length_Mean", "Pkt_Length_Mean"),
    ("Packet_Length_Std", "Pkt_Length_Std"),
    ("Packet_Length_Variance", "Pkt_Length_Var"),
    ("Fwd_Packet_Length_Max", "Fwd_Pkt_Length_Max"),
    ("Fwd_Packet_Length_Min", "Fwd_Pkt_Length_Min"),
    ("Fwd_Packet_Length_Mean", "Fwd_Pkt_Length_Mean"),
    ("Fwd_Packet_Length_Std", "Fwd_Pkt_Length_Std"),
    ("Bwd_Packet_Length_Max", "Bwd_Pkt_Length_Max"),
    ("Bwd_Packet_Length_Min", "Bwd_Pkt_Length_Min"),
    ("Bwd_Packet_Length_Mean", "Bwd_Pkt_Length_Mean"),
    ("Bwd_Packet_Length_Std", "Bwd_Pkt_Length_Std"),
    ("Average_Packet_Size", "Pkt_Size_Mean"),
    ("Avg_Fwd_Segment_Size", "Fwd_Segment_Size_Mean"),
    ("Avg_Bwd_Segment_Size", "Bwd_Segment_Size_Mean"),
    ("Fwd_Avg_Bytes_Bulk", "Fwd_Byte_Bulk_Rate_Mean"),
    ("Fwd_Avg_Packets_Bulk", "Fwd_Pkt_Bulk_Rate_Mean"),
    ("Fwd_Avg_Bulk_Rate", "Fwd_Num_Bulk_Rate_Mean"),
    ("Bwd_Avg_Bytes_Bulk", "Bwd_Byte_Bulk_Rate_Mean"),
    ("Bwd_Avg_Packets_Bulk", "Bwd_Pkt_Bulk_Rate_Mean"),
    ("Bwd_Avg_Bulk_Rate", "Bwd_Num_Bulk_Rate_Mean"),
    ("Subflow_Fwd_Packets", "Fwd_Subflow_Pkts"),
    ("Subflow_Fwd_Bytes", "Fwd_Subflow_Bytes"),
    ("Subflow_Bwd_Packets", "Bwd_Subflow_Pkts"),
    ("Subflow_Bwd_Bytes", "Bwd_Subflow_Bytes"),
    ("Init_Win_bytes_forward", "Fwd_Init_Win_Bytes"),
    ("Init_Win_bytes_backward", "Bwd_Init_Win_Bytes"),
    ("act_data_pkt_fwd", "Fwd_Act_Data_Pkt"),
    ("min_seg_size_forward", "Fwd_Seg_Size_Min"),
    ("Active_Mean", "Time_Active_Mean"),
    ("Active_Std", "Time_Active_Std"),
    ("Active_Max", "Time_Active_Max"),
    ("Active_Min", "Time_Active_Min"),
    ("Idle_Mean", "Time_Idle_Mean"),
    ("Idle_Std", "Time_Idle_Std"),
    ("Idle_Max", "Time_Idle_Max"),
    ("Idle_Min", "Time_Idle_Min"),
];

/// Looks up the canonical name for a legacy column, if it has one.
pub fn canonical_name(column: &str) -> Option<&'static str> {
    RENAMES
        .iter()
        .find(|(legacy, _)| *legacy == column)
        .map(|(_, canonical)| *canonical)
}

/// One-hot protocol indicator columns, keyed by IP protocol number.
pub const PROTOCOL_FLAGS: [(&str, u8); 3] = [("HOPOPT", 0), ("TCP", 6), ("UDP", 17)];

/// Identifying columns every raw export carries and normalization removes.
pub const IDENTIFYING_COLUMNS: [&str; 6] = [
    "Source_IP",
    "Source_Port",
    "Destination_IP",
    "Destination_Port",
    "Protocol",
    "Timestamp",
];

pub const PROTOCOL: &str = "Protocol";
pub const PROTOCOL_NAME: &str = "ProtocolName";
pub const LABEL: &str = "Label";
pub const MALICIOUS: &str = "Malicious";

pub const BENIGN_ONLY_DROPPED: [&str; 2] = ["Label", "L7Protocol"];
pub const MIXED_DROPPED: [&str; 2] = ["SimillarHTTP", "Inbound"];

/// Label value raw mixed exports use for benign flows.
pub const RAW_BENIGN: &str = "BENIGN";
pub const BENIGN_PREFIX: &str = "Benign_";
pub const BENIGN_UNKNOWN: &str = "Benign_Unknown";
